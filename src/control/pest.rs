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

// The grammar for RFC2822-style paragraphs. No implicit whitespace rule on
// purpose: a continuation line is recognized by its leading space, so the
// grammar must see every space itself.

use pest_derive::Parser;

#[derive(Parser)]
#[grammar_inline = r##"
comment = { "#" ~ (!NEWLINE ~ ANY)* }
field_name = @{ (ASCII_ALPHANUMERIC | "-" | "_" | ".")+ }
field_value = @{ (!NEWLINE ~ ANY)* }
field = { field_name ~ ":" ~ field_value ~ (NEWLINE ~ (" " | "\t") ~ field_value)* }
line = _{ field | comment }
paragraph = { line ~ (NEWLINE ~ line)* }
single_paragraph = { SOI ~ NEWLINE* ~ paragraph ~ NEWLINE* ~ EOI }
"##]
pub(super) struct Deb822Parser;

// vim: foldmethod=marker
