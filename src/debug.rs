use alloc::{collections::VecDeque, string::String};
use core::fmt;

use crate::{Dir, Links, ThreadedTree, TreeNode};

impl<T> ThreadedTree<T>
where
    T: TreeNode<Links<T>>,
{
    /// Writes a Graphviz description of the tree to `w`.
    ///
    /// Child links are drawn as solid edges and threads as dashed edges. Null threads (left of the
    /// minimum, right of the maximum) point at a shared `nil` node.
    pub fn dotgraph<'a, W, K>(&'a self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
        K: fmt::Display + From<&'a T::Key>,
    {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        let mut queue = VecDeque::new();
        queue.push_back(root);

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{\n"
        )?;
        writeln!(w, "\"graph{name}-nil\" [shape=point];")?;

        let mut links = String::new();

        for _depth in 0.. {
            use fmt::Write;
            let remaining = queue.len();
            if remaining == 0 {
                break;
            }

            write!(w, "{{rank=same; ")?;

            for _ in 0..remaining {
                let Some(node) = queue.pop_front() else {
                    break;
                };

                let key: K = unsafe { node.as_ref().key().into() };
                write!(w, "\"graph{name}-{key}\" [label=\"{key}\"]; ")?;

                for dir in [Dir::Left, Dir::Right] {
                    let node_links = unsafe { T::links(node).as_ref() };
                    let port = match dir {
                        Dir::Left => "sw",
                        Dir::Right => "se",
                    };

                    if let Some(child) = node_links.child(dir) {
                        let child_key: K = unsafe { child.as_ref().key().into() };

                        queue.push_back(child);
                        writeln!(
                            links,
                            "\"graph{name}-{key}\":{port} -> \"graph{name}-{child_key}\";"
                        )?;
                    } else if let Some(target) = node_links.slot(dir) {
                        let target_key: K = unsafe { target.as_ref().key().into() };

                        writeln!(
                            links,
                            "\"graph{name}-{key}\":{port} -> \"graph{name}-{target_key}\" [style=dashed, constraint=false];"
                        )?;
                    } else {
                        writeln!(
                            links,
                            "\"graph{name}-{key}\":{port} -> \"graph{name}-nil\" [style=dashed, constraint=false];"
                        )?;
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
