use proc_macro::TokenStream;
mod opcode;

/// Used on the Instruction enum.
///
/// An instruction is an opcode digit paired with a fixed number of two digit operands,
/// and enums lend themselves naturally to this usecase. The position of a variant
/// in the enum is its opcode, and the number of unnamed fields is its arity. Every field
/// type must convert from and into `u8`.
///
/// This Macro generates the following:
/// * a `pub const <VARIANT>: u8` holding the opcode of each variant
/// * `pub const ARITY: [usize; N]`, the operand count indexed by opcode
/// * Self::opcode(&self) -> u8
/// * Self::arity(&self) -> usize
/// * Self::arity_of(u8) -> `Option<usize>`
/// * Self::operands(&self) -> `Vec<u8>`, the raw operand values in stream order
/// * Self::from_fields(u8, &[u8]) -> `Option<Self>`, which returns None if the opcode is
///   unknown or the number of fields doesn't match its arity
#[proc_macro_derive(OpCode)]
pub fn convert(tokens: TokenStream) -> TokenStream {
    opcode::opcode_impl(tokens)
}
