use crate::input::IsrInput;
use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};
use syn::{Error, ItemFn, Result, ReturnType};

/// Checks that the handler can be bound to a VIC slot: `fn()` with nothing else attached.
fn check_signature(item: &ItemFn) -> Result<()> {
    let sig = &item.sig;
    let valid = sig.inputs.is_empty()
        && matches!(sig.output, ReturnType::Default)
        && sig.generics.params.is_empty()
        && sig.generics.where_clause.is_none()
        && sig.asyncness.is_none()
        && sig.constness.is_none()
        && sig.unsafety.is_none()
        && sig.abi.is_none()
        && sig.variadic.is_none();
    match valid {
        true => Ok(()),
        false => Err(Error::new_spanned(
            sig,
            "interrupt handlers must have signature `fn()`",
        )),
    }
}

/// Assembly lines of the IRQ-mode entry/exit sequence around a call to `{body}`.
///
/// On entry `lr_irq` points one instruction past the return address. The caller-saved
/// registers and the SPSR of the interrupted context are kept on the IRQ stack
/// (8 words, so the stack stays 8-byte aligned for the body).
fn trampoline(name: &Ident) -> Vec<String> {
    let name = name.to_string();
    vec![
        format!(".pushsection .text.{name},\"ax\",%progbits"),
        format!(".global {name}"),
        format!(".type {name}, %function"),
        ".arm".to_string(),
        ".p2align 2".to_string(),
        format!("{name}:"),
        "sub lr, lr, #4".to_string(),
        "stmfd sp!, {{r0-r3, r12, lr}}".to_string(),
        "mrs r2, spsr".to_string(),
        "stmfd sp!, {{r2, r3}}".to_string(),
        "bl {body}".to_string(),
        "ldmfd sp!, {{r2, r3}}".to_string(),
        "msr spsr_cxsf, r2".to_string(),
        "ldmfd sp!, {{r0-r3, r12, pc}}^".to_string(),
        format!(".size {name}, . - {name}"),
        ".popsection".to_string(),
    ]
}

/// Expands `#[isr]` on `item`.
pub fn isr(input: &IsrInput, item: ItemFn) -> Result<TokenStream> {
    check_signature(&item)?;

    let lpc_vic = &input.lpc_vic;
    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = item;
    let name = &sig.ident;
    let body = format_ident!("__lpc_vic_isr_{}", name, span = Span::call_site());

    let bank = match &input.bank {
        Some(bank) => quote!(#bank()),
        None => quote!(unsafe { #lpc_vic::isr::hardware_bank() }),
    };
    let clear = input
        .channel
        .as_ref()
        .map(|channel| quote!(#lpc_vic::Channel::#channel.clear_pending(&bank);));
    let asm_lines = trampoline(name);

    Ok(quote! {
        #[doc(hidden)]
        #[allow(non_snake_case)]
        unsafe extern "C" fn #body() {
            #(#attrs)*
            #[inline(always)]
            fn #name() #block

            #name();
            let bank = #bank;
            #clear
            #lpc_vic::isr::acknowledge(&bank);
        }

        #[cfg(all(target_arch = "arm", not(target_feature = "mclass")))]
        ::core::arch::global_asm!(
            #(#asm_lines),*,
            body = sym #body,
        );

        #[cfg(all(target_arch = "arm", not(target_feature = "mclass")))]
        extern "C" {
            #vis fn #name();
        }

        #[cfg(not(all(target_arch = "arm", not(target_feature = "mclass"))))]
        #vis unsafe extern "C" fn #name() {
            unsafe { #body() }
        }
    })
}
