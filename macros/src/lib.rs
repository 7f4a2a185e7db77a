use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Ident, ItemFn, LitStr};

/// Runtime a test body runs on.
enum Flavor {
  /// Plain `#[test]`.
  Sync,
  /// Single-threaded tokio runtime.
  Local,
  /// Multi-threaded tokio runtime, for tests that race producers against
  /// subscribers.
  Shared,
}

const USAGE: &str = "rxmux_macro::test accepts: #[rxmux_macro::test], \
                     #[rxmux_macro::test(local)] or #[rxmux_macro::test(shared)]";

fn parse_flavor(args: TokenStream2, is_async: bool) -> syn::Result<Flavor> {
  if args.is_empty() {
    return Ok(if is_async { Flavor::Local } else { Flavor::Sync });
  }
  if !is_async {
    return Err(syn::Error::new(
      args.span(),
      "runtime flavors only apply to async tests; drop the argument or make the test async",
    ));
  }

  let (name, span) = if let Ok(ident) = syn::parse2::<Ident>(args.clone()) {
    (ident.to_string(), ident.span())
  } else if let Ok(lit) = syn::parse2::<LitStr>(args.clone()) {
    (lit.value(), lit.span())
  } else {
    return Err(syn::Error::new(args.span(), USAGE));
  };

  match name.as_str() {
    "local" => Ok(Flavor::Local),
    "shared" => Ok(Flavor::Shared),
    _ => Err(syn::Error::new(span, USAGE)),
  }
}

fn native_attr(flavor: &Flavor) -> TokenStream2 {
  match flavor {
    Flavor::Sync => quote!(test),
    Flavor::Local => quote!(tokio::test(flavor = "current_thread")),
    Flavor::Shared => quote!(tokio::test(flavor = "multi_thread", worker_threads = 4)),
  }
}

/// Test attribute used across the crate.
///
/// Sync tests expand to `#[test]`, async tests to `#[tokio::test]` with the
/// requested flavor. On wasm32 both expand to `wasm_bindgen_test`.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input = parse_macro_input!(item as ItemFn);
  let is_async = input.sig.asyncness.is_some();

  let flavor = match parse_flavor(TokenStream2::from(attr), is_async) {
    Ok(flavor) => flavor,
    Err(err) => return err.to_compile_error().into(),
  };

  let native = native_attr(&flavor);
  let wasm = if is_async {
    quote!(wasm_bindgen_test::wasm_bindgen_test(async))
  } else {
    quote!(wasm_bindgen_test::wasm_bindgen_test)
  };

  let expanded = quote! {
    #[cfg_attr(target_arch = "wasm32", #wasm)]
    #[cfg_attr(not(target_arch = "wasm32"), #native)]
    #input
  };

  expanded.into()
}
