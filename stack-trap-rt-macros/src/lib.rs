//! Macros for the stack-trap-rt library
//!
//! Provides the `#[crash_text]` and `#[crash_error]` attribute macros.
//!
//! Do not use this crate directly.
//!
//! Based on <https://github.com/rust-embedded/cortex-m/tree/c-m-rt-v0.7.5/cortex-m-rt/macros>.

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    parse, parse_macro_input, spanned::Spanned, AttrStyle, Attribute, Ident, ItemFn, ReturnType,
    Type, Visibility,
};

/// Creates the `_crash_text` sink that receives the register dump.
///
/// When placed on a function like:
///
/// ```rust ignore
/// #[crash_text]
/// fn console(text: &str) {
///     uart_write(text.as_bytes());
/// }
/// ```
///
/// You get something like:
///
/// ```rust ignore
/// #[doc(hidden)]
/// #[export_name = "_crash_text"]
/// pub unsafe extern "C" fn __stack_trap_rt_crash_text(ptr: *const u8, len: usize) {
///     let text = unsafe {
///         core::str::from_utf8_unchecked(core::slice::from_raw_parts(ptr, len))
///     };
///     console(text)
/// }
///
/// fn console(text: &str) {
///     uart_write(text.as_bytes());
/// }
/// ```
///
/// The sink runs on the small stack below the guard, so keep it lean.
#[proc_macro_attribute]
pub fn crash_text(args: TokenStream, input: TokenStream) -> TokenStream {
    handle_sink(args, input, Kind::Text)
}

/// Creates the `_crash_error` sink that is called once the dump is complete.
///
/// It receives code 255 and a message, and must not return.
///
/// When placed on a function like:
///
/// ```rust ignore
/// #[crash_error]
/// fn recover(code: i32, message: &str) -> ! {
///     restart_interpreter(code, message)
/// }
/// ```
///
/// You get something like:
///
/// ```rust ignore
/// #[doc(hidden)]
/// #[export_name = "_crash_error"]
/// pub unsafe extern "C" fn __stack_trap_rt_crash_error(
///     code: i32,
///     ptr: *const u8,
///     len: usize,
/// ) -> ! {
///     let message = unsafe {
///         core::str::from_utf8_unchecked(core::slice::from_raw_parts(ptr, len))
///     };
///     recover(code, message)
/// }
///
/// fn recover(code: i32, message: &str) -> ! {
///     restart_interpreter(code, message)
/// }
/// ```
#[proc_macro_attribute]
pub fn crash_error(args: TokenStream, input: TokenStream) -> TokenStream {
    handle_sink(args, input, Kind::Error)
}

/// Note if we got `#[crash_text]` or `#[crash_error]`
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum Kind {
    /// Corresponds to `#[crash_text]`
    Text,
    /// Corresponds to `#[crash_error]`
    Error,
}

impl Kind {
    fn attribute(self) -> &'static str {
        match self {
            Kind::Text => "#[crash_text]",
            Kind::Error => "#[crash_error]",
        }
    }

    fn arguments(self) -> usize {
        match self {
            Kind::Text => 1,
            Kind::Error => 2,
        }
    }

    fn signature(self) -> &'static str {
        match self {
            Kind::Text => "fn(&str)",
            Kind::Error => "fn(i32, &str) -> !",
        }
    }
}

/// A common routine for both sinks
fn handle_sink(args: TokenStream, input: TokenStream, kind: Kind) -> TokenStream {
    let f = parse_macro_input!(input as ItemFn);

    if !args.is_empty() {
        return parse::Error::new(Span::call_site(), "This attribute accepts no arguments")
            .to_compile_error()
            .into();
    }

    if let Err(error) = check_attr_whitelist(&f.attrs, kind) {
        return error;
    }

    let returns_never = match f.sig.output {
        ReturnType::Type(_, ref ty) => matches!(**ty, Type::Never(_)),
        ReturnType::Default => false,
    };

    // check the function signature.
    //
    // the sink is called from the reporter, so it must be safe to call and
    // generic over nothing
    let valid_signature = f.sig.constness.is_none()
        && f.sig.asyncness.is_none()
        && f.sig.unsafety.is_none()
        && f.vis == Visibility::Inherited
        && f.sig.abi.is_none()
        && f.sig.inputs.len() == kind.arguments()
        && f.sig.generics.params.is_empty()
        && f.sig.generics.where_clause.is_none()
        && f.sig.variadic.is_none()
        && match kind {
            Kind::Text => matches!(f.sig.output, ReturnType::Default),
            Kind::Error => returns_never,
        };

    if !valid_signature {
        return parse::Error::new(
            f.span(),
            format!(
                "`{}` function must have signature `{}`",
                kind.attribute(),
                kind.signature()
            ),
        )
        .to_compile_error()
        .into();
    }

    let ident = &f.sig.ident;
    let (ref cfgs, ref attrs) = extract_cfgs(f.attrs.clone());

    let sink = match kind {
        // unsafe extern "C" fn _crash_text(ptr: *const u8, len: usize);
        Kind::Text => {
            let tramp_ident = Ident::new("__stack_trap_rt_crash_text", Span::call_site());
            quote!(
                #(#cfgs)*
                #(#attrs)*
                #[doc(hidden)]
                #[export_name = "_crash_text"]
                pub unsafe extern "C" fn #tramp_ident(ptr: *const u8, len: usize) {
                    let text = unsafe {
                        ::core::str::from_utf8_unchecked(::core::slice::from_raw_parts(ptr, len))
                    };
                    #ident(text)
                }

                #f
            )
        }
        // unsafe extern "C" fn _crash_error(code: i32, ptr: *const u8, len: usize) -> !;
        Kind::Error => {
            let tramp_ident = Ident::new("__stack_trap_rt_crash_error", Span::call_site());
            quote!(
                #(#cfgs)*
                #(#attrs)*
                #[doc(hidden)]
                #[export_name = "_crash_error"]
                pub unsafe extern "C" fn #tramp_ident(code: i32, ptr: *const u8, len: usize) -> ! {
                    let message = unsafe {
                        ::core::str::from_utf8_unchecked(::core::slice::from_raw_parts(ptr, len))
                    };
                    #ident(code, message)
                }

                #f
            )
        }
    };

    quote!(
        #sink
    )
    .into()
}

/// Given a list of attributes, split them into `cfg` and non-`cfg`.
///
/// Returns `(cfgs, non_cfgs)`.
fn extract_cfgs(attrs: Vec<Attribute>) -> (Vec<Attribute>, Vec<Attribute>) {
    let mut cfgs = vec![];
    let mut not_cfgs = vec![];

    for attr in attrs {
        if eq(&attr, "cfg") {
            cfgs.push(attr);
        } else {
            not_cfgs.push(attr);
        }
    }

    (cfgs, not_cfgs)
}

/// Check whether any disallowed attributes have been applied to our sink function.
fn check_attr_whitelist(attrs: &[Attribute], caller: Kind) -> Result<(), TokenStream> {
    let whitelist = &[
        "doc",
        "link_section",
        "cfg",
        "allow",
        "warn",
        "deny",
        "forbid",
        "cold",
        "inline",
        "expect",
    ];

    'o: for attr in attrs {
        for val in whitelist {
            if eq(attr, val) {
                continue 'o;
            }
        }

        let err_str = match caller {
            Kind::Text => "this attribute is not allowed on a stack-trap-rt text sink",
            Kind::Error => "this attribute is not allowed on a stack-trap-rt error sink",
        };

        return Err(parse::Error::new(attr.span(), err_str)
            .to_compile_error()
            .into());
    }

    Ok(())
}

/// Returns `true` if `attr.path` matches `name`
fn eq(attr: &Attribute, name: &str) -> bool {
    attr.style == AttrStyle::Outer && attr.path().is_ident(name)
}
