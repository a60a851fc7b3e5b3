//! Host source emission
//!
//! Turns exported layouts and compiled dispatch trees into host program
//! text: behavior blocks declaring the header, ID and data lists, the array
//! selector and index corrector, the read accessor, and `define!`d sizing
//! constants. Dispatch trees become nested `if` chains over one `stackvar`.

use crate::config::LayoutConfig;
use crate::disk::DiskLayout;
use crate::dispatch::{DispatchNode, DispatchProgram, DispatchTree, Target};
use crate::error::Result;
use crate::layout::{ChunkedData, LayoutConstants};
use crate::memory::MemoryLayout;
use crate::text::{byte_string, StringAllocation};
use serde::Serialize;

/// Identifier scheme of a rendered region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegionKind {
    Disk,
    Memory,
}

impl RegionKind {
    /// Prefix of the behavior name
    fn behavior(self) -> &'static str {
        match self {
            RegionKind::Disk => "disk",
            RegionKind::Memory => "memory",
        }
    }

    /// Prefix of list and function identifiers
    fn item(self) -> &'static str {
        match self {
            RegionKind::Disk => "d_isk",
            RegionKind::Memory => "m_emory",
        }
    }

    /// Prefix of constant identifiers
    fn constant(self) -> &'static str {
        match self {
            RegionKind::Disk => "DISK",
            RegionKind::Memory => "MEMORY",
        }
    }

    fn folder(self) -> &'static str {
        match self {
            RegionKind::Disk => "Storage (LAG)",
            RegionKind::Memory => "Memory (LAG)",
        }
    }
}

/// Accumulates emitted lines
struct Emitter {
    out: String,
}

impl Emitter {
    fn new() -> Self {
        Emitter { out: String::new() }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    /// Declare a mutable host list named `item` holding `values`
    fn list<T: Serialize + ?Sized>(&mut self, item: &str, values: &T) -> Result<()> {
        self.line(format!("setItemName!(\"{}\");", item));
        self.line(format!(
            "setVal!(\"{}\", {{ {} }});",
            item,
            serde_json::to_string(values)?
        ));
        self.line(format!("setMut!(\"{}\");", item));
        Ok(())
    }

    fn constant(&mut self, name: &str, value: usize) {
        self.line(format!("inline const {} = {};", name, value));
        self.line(format!("define!({}, {});", name, value));
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Global constants every generated program needs
pub fn calculator_init(config: &LayoutConfig) -> String {
    let mut emitter = Emitter::new();
    emitter.constant("BYTES_PER_FLOAT", config.word_width);
    emitter.finish()
}

/// Render an exported disk
pub fn disk(layout: &DiskLayout) -> Result<String> {
    region(
        RegionKind::Disk,
        layout.name().as_str(),
        &layout.header_words(),
        layout.occupied_ids(),
        layout.data(),
        layout.constants(),
    )
}

/// Render an exported memory
pub fn memory(layout: &MemoryLayout) -> Result<String> {
    region(
        RegionKind::Memory,
        layout.name().as_str(),
        &layout.header_words(),
        &layout.occupied_ids(),
        layout.data(),
        layout.constants(),
    )
}

fn region<H: Serialize + ?Sized, I: Serialize + ?Sized>(
    kind: RegionKind,
    name: &str,
    header: &H,
    ids: &I,
    data: &ChunkedData,
    constants: &LayoutConstants,
) -> Result<String> {
    let item = format!("{}_{}", kind.item(), name);
    let constant = format!("{}_{}", kind.constant(), name);
    let mut emitter = Emitter::new();

    emitter.line(format!("createBehavior!(\"{}_{}\", {{", kind.behavior(), name));
    emitter.line(format!(
        "setDefaultDisplay!({{ display folder = \"{}\"; }});",
        kind.folder()
    ));

    emitter.list(&format!("{}_header", item), header)?;
    emitter.list(&format!("{}_ids", item), ids)?;
    for (i, chunk) in data.chunks().iter().enumerate() {
        emitter.list(&format!("{}_data_{}", item, i), chunk)?;
    }

    emitter.line(format!("display folder = \"{}\";", kind.folder()));
    emitter.line("display hidden = true;");
    emitter.line(format!("export function {}_array(i_ndex) {{", item));
    if data.num_chunks() == 1 {
        emitter.line(format!("{}_data_0", item));
    } else {
        emitter.line(format!(
            "const a_rray_num = floor(i_ndex / {});",
            data.chunk_size()
        ));
        let last = data.num_chunks() - 1;
        for i in 0..=last {
            let arm = if i == 0 {
                format!("if(a_rray_num == {}) {{ {}_data_{} }}", i, item, i)
            } else if i == last {
                format!("else {{ {}_data_{} }}", item, i)
            } else {
                format!("else if(a_rray_num == {}) {{ {}_data_{} }}", i, item, i)
            };
            emitter.line(arm);
        }
    }
    emitter.line("}");

    emitter.line(format!("inline function {}_index(i_ndex) {{", item));
    emitter.line(format!("1 + mod(i_ndex - 1, {})", data.chunk_size()));
    emitter.line("}");

    emitter.line(format!("display folder = \"{}\";", kind.folder()));
    emitter.line("display hidden = true;");
    emitter.line(format!("export function {}_read(i_ndex) {{", item));
    emitter.line(format!("{0}_array(i_ndex)[{0}_index(i_ndex)]", item));
    emitter.line("}");

    if let Some(name_size) = constants.header_name_size {
        emitter.constant(&format!("{}_HEADER_NAME_SIZE", constant), name_size);
    }
    emitter.constant(
        &format!("{}_HEADER_BLOCKS_SIZE", constant),
        constants.header_blocks_size,
    );
    emitter.constant(&format!("{}_HEADER_SIZE", constant), constants.header_size);
    emitter.constant(&format!("{}_BLOCK_SIZE", constant), constants.block_size);
    emitter.constant(&format!("{}_CHUNK_SIZE", constant), constants.chunk_size);
    emitter.constant(&format!("{}_NUM_CHUNKS", constant), constants.num_chunks);

    emitter.line("});");
    Ok(emitter.finish())
}

/// Render a dispatch program: the scratch declaration followed by the tree
pub fn dispatch(program: &DispatchProgram) -> String {
    format!(
        "stackvar {};\n{}",
        program.scratch,
        dispatch_node(program, program.tree.root())
    )
}

fn dispatch_node(program: &DispatchProgram, node: &DispatchNode) -> String {
    let tree = &program.tree;
    match node {
        DispatchNode::Leaf(target) => target_code(tree, *target).to_string(),
        DispatchNode::Guard {
            position,
            body,
            otherwise,
        } => format!(
            "if({pos} < ceil({len}/BYTES_PER_FLOAT)) {{ r_ead({ptr}, {pos}, &{var}); {body} }}{otherwise}",
            pos = position,
            len = program.length,
            ptr = program.pointer,
            var = program.scratch,
            body = dispatch_node(program, body),
            otherwise = else_arm(tree, &DispatchNode::Leaf(*otherwise), program),
        ),
        DispatchNode::Equals {
            value,
            then,
            otherwise,
        } => format!(
            "if({} == {}) {{ {} }}{}",
            program.scratch,
            value,
            dispatch_node(program, then),
            else_arm(tree, otherwise, program)
        ),
        DispatchNode::Less {
            pivot,
            less,
            greater_equal,
        } => format!(
            "if({} < {}) {{ {} }} else {{ {} }}",
            program.scratch,
            pivot,
            dispatch_node(program, less),
            dispatch_node(program, greater_equal)
        ),
    }
}

/// `else { ... }` for `node`, omitted when it would be empty
fn else_arm(tree: &DispatchTree, node: &DispatchNode, program: &DispatchProgram) -> String {
    match node {
        DispatchNode::Leaf(target) if tree.payload(*target).is_none() => String::new(),
        _ => format!(" else {{ {} }}", dispatch_node(program, node)),
    }
}

fn target_code(tree: &DispatchTree, target: Target) -> &str {
    tree.payload(target).unwrap_or("")
}

/// Render the allocation and writes that copy a string into host memory
pub fn string_allocation(
    allocation: &StringAllocation,
    address_var: &str,
    length_var: &str,
    capacity_var: &str,
) -> String {
    let mut emitter = Emitter::new();
    emitter.line(format!("{} = {};", capacity_var, allocation.capacity_words));
    emitter.line(format!("{} = {};", length_var, allocation.length));
    emitter.line(format!(
        "m_alloc({}, &{});",
        allocation.capacity_words, address_var
    ));
    for (index, word) in allocation.words.iter().enumerate() {
        emitter.line(format!("w_rite({}, {}, {});", address_var, index, word));
    }
    emitter.finish()
}

/// Repeat `code` once per character of `characters`
///
/// In each copy `CHARCODE` becomes the character code and `CHAR` the
/// character itself, with `"` and `\` escaped. Copies are joined by
/// `separator` and the whole is wrapped in `before` and `after`.
///
/// # Errors
///
/// `InvalidByte` for a character above 255.
pub fn for_each_char(
    characters: &str,
    code: &str,
    separator: &str,
    before: &str,
    after: &str,
) -> Result<String> {
    let codes = byte_string(characters)?;
    let copies: Vec<String> = characters
        .chars()
        .zip(codes)
        .map(|(character, char_code)| {
            let escaped = match character {
                '"' | '\\' => format!("\\{}", character),
                _ => character.to_string(),
            };
            code.replace("CHARCODE", &char_code.to_string())
                .replace("CHAR", &escaped)
        })
        .collect();

    Ok(format!("{}{}{}", before, copies.join(separator), after))
}

/// `code` with every occurrence of `find` replaced
pub fn replace(find: &str, replacement: &str, code: &str) -> String {
    code.replace(find, replacement)
}
