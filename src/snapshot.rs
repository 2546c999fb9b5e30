//! Coordinate-free pre-order snapshots.
//!
//! One line per node: `count,sample_x,sample_y,err0,err1,...`, with both
//! sample fields empty when the node has no sample. An absent child is a
//! single empty line; a leaf is therefore followed by four empty lines.
//! No header, no lengths, no version marker: the reader replicates the
//! writer's recursion exactly, so the stream only makes sense to a tree
//! with the same objective and `max_zoom`. Fragile on purpose; any parse
//! failure or truncation aborts the whole load.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{RaquadError, Result};
use crate::select::Objective;
use crate::tree::{QuadNode, RaQuadTree};
use crate::types::{Config, Point, TreeStats};

fn write_node<W: Write>(node: &QuadNode, out: &mut W) -> std::io::Result<()> {
    write!(out, "{},", node.count)?;
    match node.sample {
        Some(p) => write!(out, "{},{}", p.x, p.y)?,
        None => out.write_all(b",")?,
    }
    for error in &node.errors {
        write!(out, ",{}", error)?;
    }
    out.write_all(b"\n")?;

    match &node.children {
        None => {
            // Four absent children terminate the branch.
            for _ in 0..4 {
                out.write_all(b"\n")?;
            }
        }
        Some(children) => {
            for child in children.iter() {
                write_node(child, out)?;
            }
        }
    }
    Ok(())
}

struct LineReader<R> {
    inner: R,
    line: u64,
    buf: String,
}

impl<R: BufRead> LineReader<R> {
    /// The next line and its 1-based number, without the trailing newline.
    fn next_line(&mut self) -> Result<(u64, &str)> {
        self.buf.clear();
        if self.inner.read_line(&mut self.buf)? == 0 {
            return Err(RaquadError::UnexpectedEof);
        }
        self.line += 1;
        Ok((self.line, self.buf.trim_end_matches(['\r', '\n'])))
    }
}

fn invalid(line: u64, reason: &str) -> RaquadError {
    RaquadError::InvalidFormat {
        line,
        reason: reason.to_string(),
    }
}

fn parse_record(line: &str, lineno: u64, error_len: usize) -> Result<QuadNode> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 3 + error_len {
        return Err(RaquadError::ObjectiveMismatch {
            expected: error_len,
            found: fields.len().saturating_sub(3),
        });
    }

    let count: u64 = fields[0]
        .parse()
        .map_err(|_| invalid(lineno, "count is not an unsigned integer"))?;

    let sample = if fields[1].is_empty() {
        if !fields[2].is_empty() {
            return Err(invalid(lineno, "sample has y but no x"));
        }
        None
    } else {
        let x: f64 = fields[1]
            .parse()
            .map_err(|_| invalid(lineno, "sample x is not a number"))?;
        let y: f64 = fields[2]
            .parse()
            .map_err(|_| invalid(lineno, "sample y is not a number"))?;
        Some(Point::new(x, y))
    };

    let mut errors = vec![0.0; error_len].into_boxed_slice();
    for (slot, field) in errors.iter_mut().zip(&fields[3..]) {
        *slot = field
            .parse()
            .map_err(|_| invalid(lineno, "error value is not a number"))?;
    }

    Ok(QuadNode {
        sample,
        count,
        errors,
        children: None,
    })
}

fn read_node<R: BufRead>(reader: &mut LineReader<R>, error_len: usize) -> Result<Option<QuadNode>> {
    let (lineno, line) = reader.next_line()?;
    if line.is_empty() {
        return Ok(None);
    }
    let mut node = parse_record(line, lineno, error_len)?;

    let nw = read_node(reader, error_len)?;
    let ne = read_node(reader, error_len)?;
    let sw = read_node(reader, error_len)?;
    let se = read_node(reader, error_len)?;
    node.children = match (nw, ne, sw, se) {
        (None, None, None, None) => None,
        (Some(nw), Some(ne), Some(sw), Some(se)) => Some(Box::new([nw, ne, sw, se])),
        _ => return Err(invalid(reader.line, "node has a partial set of children")),
    };
    Ok(Some(node))
}

fn node_total(node: &QuadNode) -> u64 {
    1 + match &node.children {
        Some(children) => children.iter().map(node_total).sum(),
        None => 0,
    }
}

impl RaQuadTree {
    /// Write the tree as a snapshot stream.
    pub fn save_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = BufWriter::new(writer);
        write_node(&self.root, &mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Write the tree as a snapshot file at `path`.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save_to(File::create(path.as_ref())?)?;
        log::info!(
            "saved snapshot of {} nodes to {}",
            self.stats.node_count + 1,
            path.as_ref().display()
        );
        Ok(())
    }

    /// Read a tree back from a snapshot stream.
    ///
    /// The stream carries no structure metadata, so `config` and
    /// `objective` must match the writing tree's. A snapshot written
    /// under a different objective or `max_zoom` fails with
    /// [`RaquadError::ObjectiveMismatch`]. The loaded tree is already
    /// finalized; ingest counters are not persisted, only the node count
    /// is reconstructed.
    pub fn load_from<R: BufRead>(reader: R, config: Config, objective: Objective) -> Result<Self> {
        config.validate().map_err(RaquadError::InvalidConfig)?;
        let error_len = objective.error_len(config.max_zoom);
        let mut reader = LineReader {
            inner: reader,
            line: 0,
            buf: String::new(),
        };
        let root = read_node(&mut reader, error_len)?
            .ok_or_else(|| invalid(1, "missing root record"))?;
        let stats = TreeStats {
            node_count: node_total(&root) - 1,
            ..TreeStats::default()
        };
        Ok(Self {
            root,
            config,
            objective,
            stats,
            finalized: true,
        })
    }

    /// Read a tree back from a snapshot file at `path`.
    pub fn load_from_path<P: AsRef<Path>>(
        path: P,
        config: Config,
        objective: Objective,
    ) -> Result<Self> {
        let tree = Self::load_from(BufReader::new(File::open(path.as_ref())?), config, objective)?;
        log::info!(
            "loaded snapshot of {} nodes from {}",
            tree.stats.node_count + 1,
            path.as_ref().display()
        );
        Ok(tree)
    }
}
