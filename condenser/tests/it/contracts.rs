//! Contracts used by the integration tests, as creation bytecode.
//!
//! Addresses baked into the bytecode are placeholders: [patch] swaps them for the addresses the
//! contracts they stand for are actually deployed to.

use revm::primitives::{Address, Bytes, address};

/// Decodes `code`, swapping each placeholder for the address it stands for.
pub fn patch(code: &str, replacements: &[(Address, Address)]) -> Bytes {
    let mut code = code.to_owned();
    for (placeholder, address) in replacements {
        let placeholder = hex::encode(placeholder);
        assert!(code.contains(&placeholder), "{placeholder} not found in code");
        code = code.replace(&placeholder, &hex::encode(address));
    }
    hex::decode(code).unwrap().into()
}

pub fn code(code: &str) -> Bytes {
    hex::decode(code).unwrap().into()
}

pub const SENDER1_PLACEHOLDER: Address = address!("4de45add9f5f0b6887081cfcfe3aca6da9eb3365");
pub const SENDER2_PLACEHOLDER: Address = address!("8cd673a7e9322cb860bb3b743820921661c7e2a7");
pub const SENDER3_PLACEHOLDER: Address = address!("edc7cea5c45f9b8804b2383cc410c7e08072d126");
pub const FORWARD_TO_FALLBACK_TARGET: Address = address!("747a802725849fbcf3a2ccd90e25685a4a244ab0");
pub const FORWARD_HALF_1_TARGET: Address = address!("7e976c98b7354c2972848031d955f628a29509dc");
pub const FORWARD_HALF_2_TARGET: Address = address!("2ea90ccb41921cf63b01d0f44a1a3082038d6494");
pub const FORWARD_HALF_3_TARGET: Address = address!("78ec6322824c9378136937e02cecde3fd36e1e18");
pub const SELF_DESTRUCT_BENEFICIARY: Address = SENDER1_PLACEHOLDER;
pub const PAY_HALF_PAYEE: Address = SENDER1_PLACEHOLDER;

pub const SET_SENDERS: [u8; 4] = [0x55, 0x79, 0x81, 0x8d];
pub const SHARE: [u8; 4] = [0xa8, 0xd5, 0xfd, 0x65];
pub const KEEP: [u8; 4] = [0xe4, 0xd0, 0x6d, 0x82];
pub const SEND_ALL: [u8; 4] = [0xe1, 0x4f, 0x68, 0x0f];
pub const WITHDRAW_ALL: [u8; 4] = [0x85, 0x38, 0x28, 0xb6];
pub const TRANSFER: [u8; 4] = [0x8a, 0x40, 0x68, 0xdd];
pub const SUI: [u8; 4] = [0xc4, 0x21, 0x24, 0x9a];

/// `setSenders(address,address)` call data.
pub fn set_senders(x: Address, y: Address) -> Bytes {
    let mut data = SET_SENDERS.to_vec();
    for address in [x, y] {
        data.extend_from_slice(&[0; 12]);
        data.extend_from_slice(address.as_slice());
    }
    data.into()
}

/// ```solidity
/// contract Sender1 {
///     address sender2;
///     address sender3;
///     function setSenders(address senderx, address sendery) public {
///         sender2 = senderx;
///         sender3 = sendery;
///     }
///     function share() public payable {
///         if (msg.sender != address(sender3)) {
///             sender2.call.value(msg.value / 2)(bytes4(sha3("share()")));
///         }
///     }
///     function sendAll() public payable {
///         sender2.call.value(this.balance)(bytes4(sha3("keep()")));
///     }
///     function keep() public payable {}
///     function() payable {}
/// }
/// ```
pub const SENDER1: &str = "606060405234610000575b5b5b6103bf8061001b6000396000f30060606040523615610060576000357c0100000000000000000000000000000000000000000000000000000000900463ffffffff1680635579818d14610069578063a8d5fd65146100bb578063e14f680f146100c5578063e4d06d82146100cf575b6100675b5b565b005b34610000576100b9600480803573ffffffffffffffffffffffffffffffffffffffff1690602001909190803573ffffffffffffffffffffffffffffffffffffffff169060200190919050506100d9565b005b6100c3610160565b005b6100cd61029d565b005b6100d7610390565b005b81600060006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff16021790555080600160006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff1602179055505b5050565b600160009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff163373ffffffffffffffffffffffffffffffffffffffff1614151561029a57600060009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff166002348115610000570460405180807f7368617265282900000000000000000000000000000000000000000000000000815250600701905060405180910390207c01000000000000000000000000000000000000000000000000000000009004906040518263ffffffff167c010000000000000000000000000000000000000000000000000000000002815260040180905060006040518083038185886185025a03f19350505050505b5b565b600060009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff163073ffffffffffffffffffffffffffffffffffffffff163160405180807f6b65657028290000000000000000000000000000000000000000000000000000815250600601905060405180910390207c01000000000000000000000000000000000000000000000000000000009004906040518263ffffffff167c010000000000000000000000000000000000000000000000000000000002815260040180905060006040518083038185886185025a03f19350505050505b565b5b5600a165627a7a7230582094424c92e68d8ea77caec662d2895cc9086f115ed7baa3f7e508b4d8d011161f0029";

/// ```solidity
/// contract Sender2 {
///     address sender1;
///     address sender3;
///     function setSenders(address senderx, address sendery) public {
///         sender1 = senderx;
///         sender3 = sendery;
///     }
///     function share() public payable {
///         sender3.call.value(msg.value / 2)(bytes4(sha3("share()")));
///     }
///     function keep() public payable {}
///     function withdrawAll() public {
///         sender3.call(bytes4(sha3("withdraw()")));
///         msg.sender.send(this.balance);
///     }
///     function() payable {}
/// }
/// ```
pub const SENDER2: &str = "606060405234610000575b5b5b6103a38061001b6000396000f30060606040523615610060576000357c0100000000000000000000000000000000000000000000000000000000900463ffffffff1680635579818d14610069578063853828b6146100bb578063a8d5fd65146100ca578063e4d06d82146100d4575b6100675b5b565b005b34610000576100b9600480803573ffffffffffffffffffffffffffffffffffffffff1690602001909190803573ffffffffffffffffffffffffffffffffffffffff169060200190919050506100de565b005b34610000576100c8610165565b005b6100d261028f565b005b6100dc610374565b005b81600060006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff16021790555080600160006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff1602179055505b5050565b600160009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff1660405180807f7769746864726177282900000000000000000000000000000000000000000000815250600a01905060405180910390207c010000000000000000000000000000000000000000000000000000000090046040518163ffffffff167c01000000000000000000000000000000000000000000000000000000000281526004018090506000604051808303816000876161da5a03f192505050503373ffffffffffffffffffffffffffffffffffffffff166108fc3073ffffffffffffffffffffffffffffffffffffffff16319081150290604051809050600060405180830381858888f19350505050505b565b600160009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff166002348115610000570460405180807f7368617265282900000000000000000000000000000000000000000000000000815250600701905060405180910390207c01000000000000000000000000000000000000000000000000000000009004906040518263ffffffff167c010000000000000000000000000000000000000000000000000000000002815260040180905060006040518083038185886185025a03f19350505050505b565b5b5600a165627a7a723058206dd48a1be1f30e54f5105f13673a3fff6be78a63bb148924dd62a145b43694440029";

/// ```solidity
/// contract Sender3 {
///     address sender1;
///     address sender2;
///     function setSenders(address senderx, address sendery) public {
///         sender1 = senderx;
///         sender2 = sendery;
///     }
///     function share() public payable {
///         sender1.call.value(msg.value / 2)(bytes4(sha3("share()")));
///         sender2.call.value(msg.value / 4)(bytes4(sha3("keep()")));
///     }
///     function withdraw() public {
///         msg.sender.send(this.balance);
///     }
///     function() payable {}
/// }
/// ```
pub const SENDER3: &str = "606060405234610000575b5b5b6103968061001b6000396000f30060606040523615610055576000357c0100000000000000000000000000000000000000000000000000000000900463ffffffff1680633ccfd60b1461005e5780635579818d1461006d578063a8d5fd65146100bf575b61005c5b5b565b005b346100005761006b6100c9565b005b34610000576100bd600480803573ffffffffffffffffffffffffffffffffffffffff1690602001909190803573ffffffffffffffffffffffffffffffffffffffff1690602001909190505061011c565b005b6100c76101a3565b005b3373ffffffffffffffffffffffffffffffffffffffff166108fc3073ffffffffffffffffffffffffffffffffffffffff16319081150290604051809050600060405180830381858888f19350505050505b565b81600060006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff16021790555080600160006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff1602179055505b5050565b600060009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff166002348115610000570460405180807f7368617265282900000000000000000000000000000000000000000000000000815250600701905060405180910390207c01000000000000000000000000000000000000000000000000000000009004906040518263ffffffff167c010000000000000000000000000000000000000000000000000000000002815260040180905060006040518083038185886185025a03f1935050505050600160009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff166004348115610000570460405180807f6b65657028290000000000000000000000000000000000000000000000000000815250600601905060405180910390207c01000000000000000000000000000000000000000000000000000000009004906040518263ffffffff167c010000000000000000000000000000000000000000000000000000000002815260040180905060006040518083038185886185025a03f19350505050505b5600a165627a7a723058208fddda1b1d980244617e9e88336ac5c0d3e1a836d77985d899cd6d96058106260029";

/// Sends a third of its balance to each of three hard-coded addresses ([SENDER1_PLACEHOLDER],
/// [SENDER2_PLACEHOLDER], [SENDER3_PLACEHOLDER]) when `transfer()` is called.
///
/// ```solidity
/// contract Test1 {
///     address Sender1 = ...;
///     address Sender2 = ...;
///     address Sender3 = ...;
///     function transfer() {
///         Sender1.send(this.balance / 3);
///         Sender2.send(this.balance / 2);
///         Sender3.send(this.balance);
///     }
///     function() payable {}
/// }
/// ```
pub const SPLIT_THREE_WAYS: &str = "6060604052734de45add9f5f0b6887081cfcfe3aca6da9eb3365600060006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff160217905550738cd673a7e9322cb860bb3b743820921661c7e2a7600160006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff16021790555073edc7cea5c45f9b8804b2383cc410c7e08072d126600260006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff16021790555034610000575b6101ee806101186000396000f3006060604052361561003f576000357c0100000000000000000000000000000000000000000000000000000000900463ffffffff1680638a4068dd14610048575b6100465b5b565b005b3461000057610055610057565b005b600060009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff166108fc60033073ffffffffffffffffffffffffffffffffffffffff1631811561000057049081150290604051809050600060405180830381858888f1935050505050600160009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff166108fc60023073ffffffffffffffffffffffffffffffffffffffff1631811561000057049081150290604051809050600060405180830381858888f1935050505050600260009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff166108fc3073ffffffffffffffffffffffffffffffffffffffff16319081150290604051809050600060405180830381858888f19350505050505b5600a165627a7a72305820a16c66241bc68fd2da2088dfbf7847f57fda4273502d7b817499d4bb32d41f1b0029";

/// `contract Test11 { function() payable {} }`
pub const PAYABLE_FALLBACK: &str = "6060604052346000575b60398060166000396000f30060606040525b600b5b5b565b0000a165627a7a723058209cedb722bf57a30e3eb00eeefc392103ea791a2001deed29f5c3809ff10eb1dd0029";

/// ```solidity
/// contract Temp {
///     function Temp() { while (true) {} }
///     function() payable {}
/// }
/// ```
pub const LOOPING_CONSTRUCTOR: &str = "6060604052346000575b5b600115601457600a565b5b5b60398060236000396000f30060606040525b600b5b5b565b0000a165627a7a7230582036c45484ccdd0a2e017c3d6842a4cf345f28abbb1eda4f27c4c26f2f8cf4dfe20029";

/// Deploys a runtime of `PUSH1 0 PUSH1 0 REVERT`: every call to it reverts.
pub const REVERTING: &str = "600580600b6000396000f360006000fd";

/// Calls [FORWARD_TO_FALLBACK_TARGET] with half its balance and an unknown selector on `transfer()`.
pub const FORWARD_TO_FALLBACK: &str = "606060405273747a802725849fbcf3a2ccd90e25685a4a244ab0600060006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff16021790555034610000575b61017a8061006e6000396000f3006060604052361561003f576000357c0100000000000000000000000000000000000000000000000000000000900463ffffffff1680638a4068dd14610048575b6100465b5b565b005b610050610052565b005b600060009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff1660023073ffffffffffffffffffffffffffffffffffffffff16318115610000570460405180807f3030000000000000000000000000000000000000000000000000000000000000815250600201905060405180910390207c01000000000000000000000000000000000000000000000000000000009004906040518263ffffffff167c010000000000000000000000000000000000000000000000000000000002815260040180905060006040518083038185886185025a03f19350505050505b5600a165627a7a723058209534adcc5831b13598cf32a78ded12b023f66269c90a45c87c1f36d9241594580029";

/// Calls `transfer()` on [FORWARD_HALF_1_TARGET] with half its balance when `transfer()` is called.
pub const FORWARD_HALF_1: &str = "6060604052737e976c98b7354c2972848031d955f628a29509dc600060006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff16021790555034610000575b61017a8061006e6000396000f3006060604052361561003f576000357c0100000000000000000000000000000000000000000000000000000000900463ffffffff1680638a4068dd14610048575b6100465b5b565b005b610050610052565b005b600060009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff1660023073ffffffffffffffffffffffffffffffffffffffff16318115610000570460405180807f7472616e73666572282900000000000000000000000000000000000000000000815250600a01905060405180910390207c01000000000000000000000000000000000000000000000000000000009004906040518263ffffffff167c010000000000000000000000000000000000000000000000000000000002815260040180905060006040518083038185886185025a03f19350505050505b5600a165627a7a7230582046f96a0ac3f73afc70f71bcc07cdbccabe47ae51ee394a2cfab75f00d2f157eb0029";

/// As [FORWARD_HALF_1], targeting [FORWARD_HALF_2_TARGET].
pub const FORWARD_HALF_2: &str = "6060604052732ea90ccb41921cf63b01d0f44a1a3082038d6494600060006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff16021790555034610000575b61017a8061006e6000396000f3006060604052361561003f576000357c0100000000000000000000000000000000000000000000000000000000900463ffffffff1680638a4068dd14610048575b6100465b5b565b005b610050610052565b005b600060009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff1660023073ffffffffffffffffffffffffffffffffffffffff16318115610000570460405180807f7472616e73666572282900000000000000000000000000000000000000000000815250600a01905060405180910390207c01000000000000000000000000000000000000000000000000000000009004906040518263ffffffff167c010000000000000000000000000000000000000000000000000000000002815260040180905060006040518083038185886185025a03f19350505050505b5600a165627a7a72305820a13c5ddcd1ac647b97968133a5d983664fd76ba48cfd38ab19e259ab1288eb330029";

/// As [FORWARD_HALF_1], targeting [FORWARD_HALF_3_TARGET].
pub const FORWARD_HALF_3: &str = "60606040527378ec6322824c9378136937e02cecde3fd36e1e18600060006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff16021790555034610000575b61017a8061006e6000396000f3006060604052361561003f576000357c0100000000000000000000000000000000000000000000000000000000900463ffffffff1680638a4068dd14610048575b6100465b5b565b005b610050610052565b005b600060009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff1660023073ffffffffffffffffffffffffffffffffffffffff16318115610000570460405180807f7472616e73666572282900000000000000000000000000000000000000000000815250600a01905060405180910390207c01000000000000000000000000000000000000000000000000000000009004906040518263ffffffff167c010000000000000000000000000000000000000000000000000000000002815260040180905060006040518083038185886185025a03f19350505050505b5600a165627a7a72305820bbfbc38327968645d3f9520195b9ac616ae17bf099046cac79d605032375956f0029";

/// Self-destructs to [SELF_DESTRUCT_BENEFICIARY] when `sui()` is called. Its fallback is payable.
pub const SELF_DESTRUCT: &str = "6060604052734de45add9f5f0b6887081cfcfe3aca6da9eb3365600060006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff1602179055505b5b5b60b68061006a6000396000f30060606040523615603d576000357c0100000000000000000000000000000000000000000000000000000000900463ffffffff168063c421249a146045575b60435b5b565b005b604b604d565b005b600060009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff16ff5b5600a165627a7a72305820e3bd6e50ab35c5105478fab7852d2307ea9c3adefc32ae8da2ec3e72dd791aed0029";

/// `transfer()` sends half its balance to [PAY_HALF_PAYEE]. It has no fallback.
pub const PAY_HALF: &str = "6060604052734de45add9f5f0b6887081cfcfe3aca6da9eb3365600060006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff1602179055505b5b5b6101708061006b6000396000f30060606040526000357c0100000000000000000000000000000000000000000000000000000000900463ffffffff1680638a4068dd1461003e575b610000565b610046610048565b005b600060009054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff1660023073ffffffffffffffffffffffffffffffffffffffff16318115610000570460405180807f7472616e73666572282900000000000000000000000000000000000000000000815250600a01905060405180910390207c01000000000000000000000000000000000000000000000000000000009004906040518263ffffffff167c010000000000000000000000000000000000000000000000000000000002815260040180905060006040518083038185886185025a03f19350505050505b5600a165627a7a723058208624b9ba0441e9d6e1e2a655d0384c4cd65cc76928dcff6eab562722140805650029";
