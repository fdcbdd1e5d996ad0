
use proc_macro::TokenStream;

/// Runs the annotated function once per RNG seed, passing it a `crate::Harness` built from that seed.
///
/// `CONDENSER_TEST_RNG_SEED` pins a single seed. Otherwise `CONDENSER_TEST_SAMPLES` seeds (default 1)
/// are tried in order.
#[proc_macro_attribute]
pub fn test(args: TokenStream, item: TokenStream) -> TokenStream {
    test::test_macro(args.into(), item.into()).into()
}
