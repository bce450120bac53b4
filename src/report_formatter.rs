use crate::diff::DiffReport;
use crate::grouping::ChangeGroup;
use crate::script::Action;
use crate::stats::DiffStats;
use crate::syn_tree::{Grammar, NodeId, NodeKind, SynTree};
use std::io::Write;

type Result = std::io::Result<()>;

pub trait ReportFormatter {
    type Output: std::io::Write;
    fn output(&mut self) -> &mut Self::Output;

    fn write_heading(&mut self, write_content: impl FnOnce(&mut Self) -> Result) -> Result {
        write!(self.output(), "== ")?;
        write_content(self)?;
        writeln!(self.output(), " ==")
    }

    fn write_section(&mut self, title: &str) -> Result {
        writeln!(self.output(), "-- {} --", title)
    }

    fn write_action_name(&mut self, action: &Action) -> Result {
        write!(self.output(), "{}", action.name().to_uppercase())
    }

    fn write_label_change(&mut self, old: Option<&str>, new: Option<&str>) -> Result {
        write!(
            self.output(),
            "«{}» -> «{}»",
            old.unwrap_or(""),
            new.unwrap_or("")
        )
    }
}

pub struct PlainReportFormatter<O> {
    output: O,
}

impl<O> PlainReportFormatter<O> {
    pub fn new(output: O) -> Self {
        PlainReportFormatter { output }
    }
}

impl<O: std::io::Write> ReportFormatter for PlainReportFormatter<O> {
    type Output = O;
    fn output(&mut self) -> &mut O {
        &mut self.output
    }
}

pub struct AnsiColoredReportFormatter<O> {
    output: O,
    cur_style: ansi_term::Style,
}

impl<O> AnsiColoredReportFormatter<O> {
    pub fn new(output: O) -> Self {
        AnsiColoredReportFormatter {
            output,
            cur_style: ansi_term::Style::new(),
        }
    }
}

fn style_for_action(action: &Action) -> ansi_term::Style {
    match action {
        Action::Insert { .. } => ansi_term::Color::Green.normal(),
        Action::Delete { .. } => ansi_term::Color::Red.normal(),
        Action::Update { .. } => ansi_term::Color::Yellow.normal(),
        Action::Move { .. } => ansi_term::Color::Blue.normal(),
    }
}

impl<O: std::io::Write> ReportFormatter for AnsiColoredReportFormatter<O> {
    type Output = O;
    fn output(&mut self) -> &mut O {
        &mut self.output
    }

    fn write_heading(&mut self, write_content: impl FnOnce(&mut Self) -> Result) -> Result {
        self.write_with_style(self.cur_style.bold(), |fmt| {
            write!(fmt.output(), "== ")?;
            write_content(fmt)?;
            write!(fmt.output(), " ==")
        })?;
        writeln!(self.output())
    }

    fn write_section(&mut self, title: &str) -> Result {
        self.write_with_style(self.cur_style.dimmed(), |fmt| {
            write!(fmt.output(), "-- {} --", title)
        })?;
        writeln!(self.output())
    }

    fn write_action_name(&mut self, action: &Action) -> Result {
        self.write_with_style(style_for_action(action).bold(), |fmt| {
            write!(fmt.output(), "{}", action.name().to_uppercase())
        })
    }

    fn write_label_change(&mut self, old: Option<&str>, new: Option<&str>) -> Result {
        let old = old.unwrap_or("");
        let new = new.unwrap_or("");
        self.write_with_style(ansi_term::Color::Red.normal(), |fmt| {
            write!(fmt.output(), "«{}»", old)
        })?;
        write!(self.output(), " -> ")?;
        self.write_with_style(ansi_term::Color::Green.normal(), |fmt| {
            write!(fmt.output(), "«{}»", new)
        })
    }
}

impl<O: std::io::Write> AnsiColoredReportFormatter<O> {
    fn write_with_style(
        &mut self,
        style: ansi_term::Style,
        write_fn: impl FnOnce(&mut Self) -> Result,
    ) -> Result {
        let prev_style = self.cur_style;
        self.cur_style = style;
        write!(self.output(), "{}", prev_style.infix(style))?;
        write_fn(self)?;
        self.cur_style = prev_style;
        write!(self.output(), "{}", style.infix(prev_style))
    }
}

/// A [`DiffReport`] together with the trees and grammar needed to print it.
pub struct ReportView<'a> {
    pub report: &'a DiffReport,
    pub src: &'a SynTree,
    pub dst: &'a SynTree,
    pub grammar: &'a Grammar,
    /// Dump both trees with ids and source ranges before the changes.
    pub show_trees: bool,
    /// List matched pairs and the nodes left unmatched on each side.
    pub show_mappings: bool,
    pub show_stats: bool,
}

impl<'a> ReportView<'a> {
    pub fn new(
        report: &'a DiffReport,
        src: &'a SynTree,
        dst: &'a SynTree,
        grammar: &'a Grammar,
    ) -> Self {
        ReportView {
            report,
            src,
            dst,
            grammar,
            show_trees: false,
            show_mappings: false,
            show_stats: false,
        }
    }

    pub fn write_with<F: ReportFormatter>(&self, fmt: &mut F) -> Result {
        if self.show_trees {
            self.write_tree(fmt, "source tree", self.src)?;
            self.write_tree(fmt, "destination tree", self.dst)?;
        }
        if self.report.script.is_empty() {
            writeln!(fmt.output(), "no changes")?;
        }
        for group in &self.report.groups {
            self.write_group(fmt, group)?;
        }
        if self.show_mappings {
            self.write_mappings(fmt)?;
            self.write_unmapped(
                fmt,
                "unmapped source (deleted)",
                self.src,
                self.report.mapping.unmapped_src(self.src),
            )?;
            self.write_unmapped(
                fmt,
                "unmapped destination (inserted)",
                self.dst,
                self.report.mapping.unmapped_dst(self.dst),
            )?;
        }
        if self.show_stats {
            self.write_stats(fmt, &self.report.stats)?;
        }
        Ok(())
    }

    fn write_group<F: ReportFormatter>(&self, fmt: &mut F, group: &ChangeGroup) -> Result {
        fmt.write_heading(|fmt| {
            write!(fmt.output(), "{}", group.label)?;
            if !group.is_uncategorized() {
                write!(fmt.output(), " ({})", group.nature)?;
            }
            Ok(())
        })?;
        for &index in &group.actions {
            if let Some(action) = self.report.script.actions().get(index) {
                write!(fmt.output(), "  ")?;
                self.write_action(fmt, action)?;
                writeln!(fmt.output())?;
            }
        }
        Ok(())
    }

    fn write_node(
        &self,
        fmt: &mut impl ReportFormatter,
        kind: NodeKind,
        label: Option<&str>,
    ) -> Result {
        write!(fmt.output(), "{}", self.grammar.name(kind))?;
        if let Some(label) = label {
            write!(fmt.output(), ": {}", label)?;
        }
        Ok(())
    }

    fn write_place(
        &self,
        fmt: &mut impl ReportFormatter,
        parent: Option<NodeId>,
        position: usize,
    ) -> Result {
        match parent {
            Some(parent) => write!(fmt.output(), " into {} at {}", parent, position),
            None => write!(fmt.output(), " as root at {}", position),
        }
    }

    fn write_action<F: ReportFormatter>(&self, fmt: &mut F, action: &Action) -> Result {
        fmt.write_action_name(action)?;
        write!(fmt.output(), " ")?;
        match action {
            Action::Insert {
                node,
                kind,
                label,
                parent,
                position,
                ..
            } => {
                self.write_node(fmt, *kind, label.as_deref())?;
                write!(fmt.output(), " {}", node)?;
                self.write_place(fmt, *parent, *position)
            }
            Action::Delete { node } => {
                if let Some(src_node) = self.src.get(*node) {
                    self.write_node(fmt, src_node.kind, src_node.label.as_deref())?;
                }
                write!(fmt.output(), " {}", node)
            }
            Action::Update {
                node,
                old_label,
                new_label,
            } => {
                if let Some(src_node) = self.src.get(*node) {
                    write!(fmt.output(), "{} ", self.grammar.name(src_node.kind))?;
                }
                write!(fmt.output(), "{}: ", node)?;
                fmt.write_label_change(old_label.as_deref(), new_label.as_deref())
            }
            Action::Move {
                node,
                target,
                parent,
                position,
            } => {
                if let Some(dst_node) = self.dst.get(*target) {
                    self.write_node(fmt, dst_node.kind, dst_node.label.as_deref())?;
                }
                write!(fmt.output(), " {}", node)?;
                self.write_place(fmt, *parent, *position)
            }
        }
    }

    fn write_mappings<F: ReportFormatter>(&self, fmt: &mut F) -> Result {
        fmt.write_section("mapping")?;
        for (src_node, dst_node) in self.report.mapping.iter() {
            write!(fmt.output(), "  {} = {} ", src_node, dst_node)?;
            self.write_node(fmt, self.src.kind(src_node), self.src.label(src_node))?;
            writeln!(fmt.output())?;
        }
        Ok(())
    }

    fn write_unmapped<F: ReportFormatter>(
        &self,
        fmt: &mut F,
        title: &str,
        tree: &SynTree,
        nodes: impl Iterator<Item = NodeId>,
    ) -> Result {
        fmt.write_section(title)?;
        let mut nodes = nodes.peekable();
        if nodes.peek().is_none() {
            return writeln!(fmt.output(), "  none");
        }
        for node in nodes {
            write!(fmt.output(), "  {} ", node)?;
            self.write_node(fmt, tree.kind(node), tree.label(node))?;
            writeln!(fmt.output())?;
        }
        Ok(())
    }

    /// One line per node in pre-order, indented by depth.
    fn write_tree<F: ReportFormatter>(&self, fmt: &mut F, title: &str, tree: &SynTree) -> Result {
        fmt.write_section(title)?;
        for node in tree.nodes() {
            let indent = 2 * (node.metrics.depth + 1);
            write!(fmt.output(), "{:indent$}{} ", "", node.id, indent = indent)?;
            self.write_node(fmt, node.kind, node.label.as_deref())?;
            writeln!(fmt.output(), " [{},{}]", node.range.start, node.range.end)?;
        }
        Ok(())
    }

    fn write_stats<F: ReportFormatter>(&self, fmt: &mut F, stats: &DiffStats) -> Result {
        fmt.write_section("statistics")?;
        let out = fmt.output();
        writeln!(
            out,
            "  nodes: {} -> {} ({:+})",
            stats.src_nodes, stats.dst_nodes, stats.node_delta
        )?;
        writeln!(
            out,
            "  mapped: {} (ratio {:.2})",
            stats.mapped, stats.mapping_ratio
        )?;
        writeln!(
            out,
            "  unmapped: {} source, {} destination",
            stats.unmapped_src, stats.unmapped_dst
        )?;
        writeln!(
            out,
            "  actions: {} (insert {}, delete {}, update {}, move {})",
            stats.actions.total(),
            stats.actions.insert,
            stats.actions.delete,
            stats.actions.update,
            stats.actions.moves
        )?;
        writeln!(out, "  actions per node: {:.2}", stats.edit_density)?;
        writeln!(out, "  complexity: {}", stats.complexity)
    }
}
