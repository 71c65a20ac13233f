//! Text rendering for the debugger's inspection commands.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::ast::{Instruction, Label, Program};

const HEADER_WIDTH: usize = 64;

/// `-- Title -----...` padded to a fixed width.
pub fn header(title: &str) -> String {
    let lead = format!("-- {title} ");
    let fill = HEADER_WIDTH.saturating_sub(lead.chars().count());
    format!("{lead}{}\n", "-".repeat(fill))
}

/// Boxed ASCII table. Headers are upper-cased and centred, numeric cells right-aligned.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let rule: String = widths.iter().map(|w| format!("+{}", "-".repeat(w + 2))).collect::<String>() + "+\n";
    let mut out = rule.clone();
    for (h, w) in headers.iter().zip(&widths) {
        out.push_str(&format!("| {:^w$} ", h.to_uppercase(), w = *w));
    }
    out.push_str("|\n");
    out.push_str(&rule);
    for row in rows {
        for (cell, w) in row.iter().zip(&widths) {
            if cell.parse::<i64>().is_ok() {
                out.push_str(&format!("| {cell:>w$} ", w = *w));
            } else {
                out.push_str(&format!("| {cell:<w$} ", w = *w));
            }
        }
        out.push_str("|\n");
    }
    if !rows.is_empty() {
        out.push_str(&rule);
    }
    out
}

pub fn status(pc: usize, current: Option<&Instruction>, output: &str) -> String {
    let current = current.map(Instruction::disassemble).unwrap_or_else(|| "(end of program)".into());
    format!("\nProgram counter: {pc}\nCurrent instruction: {current}\nOutput: {output}\n")
}

/// Top of stack first.
pub fn stack(values: &[i64]) -> String {
    let rows: Vec<Vec<String>> = values.iter().rev().map(|v| vec![v.to_string()]).collect();
    format!("\n{}{}", header("Stack"), table(&["Value"], &rows))
}

/// Ordered by address.
pub fn heap(heap: &HashMap<i64, i64>) -> String {
    let sorted: BTreeMap<_, _> = heap.iter().collect();
    let rows: Vec<Vec<String>> =
        sorted.into_iter().map(|(a, v)| vec![a.to_string(), v.to_string()]).collect();
    format!("\n{}{}", header("Heap"), table(&["Address", "Value"], &rows))
}

pub fn call_stack(frames: &[usize]) -> String {
    let rows: Vec<Vec<String>> = frames.iter().rev().map(|f| vec![f.to_string()]).collect();
    format!("\n{}{}", header("Callstack"), table(&["Instruction index"], &rows))
}

pub fn labels(labels: &BTreeMap<Label, usize>) -> String {
    let rows: Vec<Vec<String>> =
        labels.iter().map(|(name, idx)| vec![name.to_string(), idx.to_string()]).collect();
    format!("\n{}{}", header("Label map"), table(&["Label", "Instruction index"], &rows))
}

pub fn breakpoints(points: &BTreeSet<usize>) -> String {
    let rows: Vec<Vec<String>> = points.iter().map(|b| vec![b.to_string()]).collect();
    format!("\n{}", table(&["Breakpoints"], &rows))
}

/// Full listing with `->` on the instruction at `pc`.
pub fn instructions(program: &Program, pc: usize) -> String {
    let mut out = format!("\n{}\n", header("Instructions"));
    for (i, ins) in program.instructions.iter().enumerate() {
        let marker = if i == pc { "->" } else { "  " };
        out.push_str(&format!("{marker} {i:04} {}\n", ins.disassemble()));
    }
    out
}
