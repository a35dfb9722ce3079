use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, ItemEnum};

/// an opcode is a single decimal digit in the source
const MAX_VARIANTS: usize = 10;

pub fn opcode_impl(tokens: TokenStream) -> TokenStream {
    let input = parse_macro_input!(tokens as ItemEnum);
    let variants: Vec<_> = input.variants.iter().collect();
    assert!(
        variants.len() <= MAX_VARIANTS,
        "Too many variants, an opcode must fit into one decimal digit"
    );
    let enum_name = &input.ident;

    let variant_infos: Vec<_> = variants
        .iter()
        .map(|v| {
            let arity = match &v.fields {
                syn::Fields::Unit => 0,
                syn::Fields::Named(_) => panic!("Only unit variants or unnamed fields allowed"),
                syn::Fields::Unnamed(fields) => fields.unnamed.len(),
            };
            (&v.ident, ident_to_upper(&v.ident), arity)
        })
        .collect();

    let consts = generate_opcode_consts(&variant_infos);
    let arms: Vec<_> = variant_infos
        .iter()
        .map(|(var_ident, const_name, arity)| {
            let bindings: Vec<_> = (0..*arity).map(|i| format_ident!("f{}", i)).collect();
            let fields = (0..*arity).map(|i| quote! { fields[#i].into() });
            if bindings.is_empty() {
                (
                    quote! { Self::#var_ident => #const_name, },
                    quote! { Self::#var_ident => vec![], },
                    quote! { #const_name => Self::#var_ident, },
                )
            } else {
                (
                    quote! { Self::#var_ident(..) => #const_name, },
                    quote! { Self::#var_ident(#(#bindings),*) => vec![#(u8::from(*#bindings)),*], },
                    quote! { #const_name => Self::#var_ident(#(#fields),*), },
                )
            }
        })
        .collect();

    let (opcode_arms, operand_arms, from_fields_arms): (TokenStream2, TokenStream2, TokenStream2) =
        itertools::multiunzip(arms);

    quote! {
        #consts
        impl #enum_name {
            pub fn opcode(&self) -> u8 {
                match self {
                    #opcode_arms
                }
            }

            pub fn arity(&self) -> usize {
                ARITY[self.opcode() as usize]
            }

            pub fn arity_of(opcode: u8) -> Option<usize> {
                ARITY.get(opcode as usize).copied()
            }

            /// the raw operand values, in the order in which they are encoded
            pub fn operands(&self) -> Vec<u8> {
                match self {
                    #operand_arms
                }
            }

            pub fn from_fields(opcode: u8, fields: &[u8]) -> Option<Self> {
                if Self::arity_of(opcode)? != fields.len() {
                    return None;
                }
                Some(match opcode {
                    #from_fields_arms
                    _ => return None,
                })
            }
        }
    }
    .into()
}

/// generates tokens that define a const u8 for each variant, plus the arity table
fn generate_opcode_consts(variant_infos: &[(&syn::Ident, syn::Ident, usize)]) -> TokenStream2 {
    let len = variant_infos.len();
    let arities = variant_infos.iter().map(|(_, _, arity)| arity);
    let consts: TokenStream2 = variant_infos
        .iter()
        .enumerate()
        .map(|(i, (_, name, _))| {
            let i = i as u8;
            quote! {pub const #name: u8 = #i;}
        })
        .collect();
    quote! {
        #consts
        /// number of operands per opcode, indexed by opcode
        pub const ARITY: [usize; #len] = [#(#arities),*];
    }
}

fn ident_to_upper(i: &syn::Ident) -> syn::Ident {
    // LoopStart -> LOOP_START
    let mut name = String::new();
    for (idx, c) in i.to_string().chars().enumerate() {
        if c.is_uppercase() && idx > 0 {
            name.push('_');
        }
        name.extend(c.to_uppercase());
    }
    syn::Ident::new(&name, i.span())
}
