// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

// The grammar for dependency fields. Operators that the dialect rejects
// (`!=`, `<>`, a lone `<` or `>`) are accepted here on purpose so that the
// conversion layer can produce a specific error instead of a generic
// parse failure.

use pest_derive::Parser;

#[derive(Parser)]
#[grammar_inline = r#"
WHITESPACE = _{ " " | "\t" | NEWLINE }

package_name = @{ (ASCII_ALPHA_LOWER | ASCII_DIGIT | "+" | "-" | ".")+ }

version_operator = @{ "<<" | "<=" | "<>" | "<" | ">>" | ">=" | ">" | "!=" | "=" }
version = @{ (ASCII_ALPHANUMERIC | "." | "+" | "~" | ":" | ";" | "-")+ }
version_constraint = { "(" ~ version_operator? ~ version ~ ")" }

not = { "!" }
arch_name = @{ (ASCII_ALPHA_LOWER | ASCII_DIGIT | "-")+ }
arch_constraint = { not? ~ arch_name }
arch_constraints = { "[" ~ arch_constraint+ ~ "]" }

possibility = { package_name ~ version_constraint? ~ arch_constraints? }
relation = { possibility ~ ("|" ~ possibility)* }
dependency = { SOI ~ (relation ~ ("," ~ relation)*)? ~ ","? ~ EOI }
"#]
pub(super) struct DependencyParser;

// vim: foldmethod=marker
