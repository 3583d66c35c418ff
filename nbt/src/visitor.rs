//! Visitor API.

use std::fmt::Write;

use crate::{NbtCompound, NbtList, NbtTag};

/// Callbacks for a depth-first walk over a tree, see [`walk_compound`].
///
/// `name` is the key in the parent compound, or `None` for list elements and the root.
pub trait NbtVisitor {
    type Err;

    fn visit_value(&mut self, name: Option<&str>, value: &NbtTag) -> Result<(), Self::Err>;
    fn enter_compound(
        &mut self,
        name: Option<&str>,
        compound: &NbtCompound,
    ) -> Result<(), Self::Err>;
    fn leave_compound(
        &mut self,
        name: Option<&str>,
        compound: &NbtCompound,
    ) -> Result<(), Self::Err>;
    fn enter_list(&mut self, name: Option<&str>, list: &NbtList) -> Result<(), Self::Err>;
    fn leave_list(&mut self, name: Option<&str>, list: &NbtList) -> Result<(), Self::Err>;
}

/// Walks `root` and everything under it in insertion order. Stops at the first error.
pub fn walk_compound<V: NbtVisitor>(
    visitor: &mut V,
    name: Option<&str>,
    root: &NbtCompound,
) -> Result<(), V::Err> {
    visitor.enter_compound(name, root)?;
    for (key, value) in root {
        walk(visitor, Some(key.as_str()), value)?;
    }
    visitor.leave_compound(name, root)
}

pub fn walk<V: NbtVisitor>(visitor: &mut V, name: Option<&str>, value: &NbtTag) -> Result<(), V::Err> {
    match value {
        NbtTag::Compound(compound) => walk_compound(visitor, name, compound),
        NbtTag::List(list) => {
            visitor.enter_list(name, list)?;
            for item in list {
                walk(visitor, None, item)?;
            }
            visitor.leave_list(name, list)
        }
        value => visitor.visit_value(name, value),
    }
}

/// Writes a tree as an indented outline, one value per line, each scalar followed by its type.
pub struct NbtPrettyPrinter<'w, W>
where
    W: Write,
{
    writer: &'w mut W,
    indent_size: usize,
    indent_level: usize,
}

impl<'w, W> NbtPrettyPrinter<'w, W>
where
    W: Write,
{
    pub fn new(writer: &'w mut W, indent_size: usize) -> Self {
        Self {
            writer,
            indent_size,
            indent_level: 0,
        }
    }

    fn write_indent(&mut self) -> std::fmt::Result {
        for _ in 0..(self.indent_size * self.indent_level) {
            self.writer.write_char(' ')?;
        }
        Ok(())
    }

    fn write_name(&mut self, name: Option<&str>, separator: &str) -> std::fmt::Result {
        self.write_indent()?;
        match name {
            Some(name) if !name.is_empty() => write!(self.writer, "{name}{separator}"),
            _ => Ok(()),
        }
    }
}

impl<'w, W> NbtVisitor for NbtPrettyPrinter<'w, W>
where
    W: Write,
{
    type Err = std::fmt::Error;

    fn visit_value(&mut self, name: Option<&str>, value: &NbtTag) -> Result<(), Self::Err> {
        self.write_name(name, ": ")?;
        match value {
            NbtTag::Byte(v) => write!(self.writer, "{v}")?,
            NbtTag::Short(v) => write!(self.writer, "{v}")?,
            NbtTag::Int(v) => write!(self.writer, "{v}")?,
            NbtTag::Long(v) => write!(self.writer, "{v}")?,
            NbtTag::Float(v) => write!(self.writer, "{v:?}")?,
            NbtTag::Double(v) => write!(self.writer, "{v:?}")?,
            NbtTag::ByteArray(v) => write!(self.writer, "{v:?}")?,
            NbtTag::String(v) => write!(self.writer, "{v:?}")?,
            NbtTag::IntArray(v) => write!(self.writer, "{v:?}")?,
            NbtTag::List(_) | NbtTag::Compound(_) => {}
        }
        writeln!(self.writer, " ({})", value.tag())
    }

    fn enter_compound(&mut self, name: Option<&str>, _compound: &NbtCompound) -> Result<(), Self::Err> {
        self.write_name(name, " ")?;
        self.indent_level += 1;
        writeln!(self.writer, "{{")
    }

    fn leave_compound(&mut self, _name: Option<&str>, _compound: &NbtCompound) -> Result<(), Self::Err> {
        self.indent_level -= 1;
        self.write_indent()?;
        writeln!(self.writer, "}}")
    }

    fn enter_list(&mut self, name: Option<&str>, list: &NbtList) -> Result<(), Self::Err> {
        self.write_name(name, " ")?;
        self.indent_level += 1;
        writeln!(self.writer, "[{}; {}", list.element(), list.len())
    }

    fn leave_list(&mut self, _name: Option<&str>, _list: &NbtList) -> Result<(), Self::Err> {
        self.indent_level -= 1;
        self.write_indent()?;
        writeln!(self.writer, "]")
    }
}

/// Renders `root` with [`NbtPrettyPrinter`].
pub fn pretty_print(root: &NbtCompound, indent_size: usize) -> String {
    let mut out = String::new();
    let mut printer = NbtPrettyPrinter::new(&mut out, indent_size);
    // Writing to a String cannot fail.
    let _ = walk_compound(&mut printer, None, root);
    out
}
