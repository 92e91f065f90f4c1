use proc_macro::TokenStream;

mod input;
mod isr;

/// Turns a `fn()` into an IRQ handler that can be bound to a VIC slot.
///
/// The body runs as an ordinary function. On ARM targets, the exported symbol is a
/// hand-written IRQ entry/exit sequence around it. After the body returns, the handler
/// clears the pending flag of `channel` (if given) and acknowledges the VIC.
///
/// Ex. `#[isr(bank = <fn returning a register bank>, channel = <Channel variant>)]`
#[proc_macro_attribute]
pub fn isr(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(args as input::IsrInput);
    let item = syn::parse_macro_input!(item as syn::ItemFn);

    match isr::isr(&input, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
