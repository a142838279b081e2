use docx_rs::{
    DocumentChild, InsertChild, Paragraph, ParagraphChild, Run, RunChild, Table, TableCellContent,
};

use super::{BackendError, BackendResult};

/// Reads an office document as an ordered list of paragraph texts.
pub trait ParagraphReader: Send + Sync {
    fn paragraphs(&self, data: &[u8]) -> BackendResult<Vec<String>>;
}

/// Paragraph reader backed by `docx-rs`.
///
/// Tables are flattened one row per entry with cells joined by ` | `, so the
/// daily-log tables common in SOF reports keep their row structure.
pub struct DocxReader;

impl ParagraphReader for DocxReader {
    fn paragraphs(&self, data: &[u8]) -> BackendResult<Vec<String>> {
        let docx = docx_rs::read_docx(data)
            .map_err(|e| BackendError::new(format!("DOCX parsing failed: {e}")))?;

        let mut out = Vec::new();
        for child in &docx.document.children {
            match child {
                DocumentChild::Paragraph(p) => out.push(paragraph_text(p)),
                DocumentChild::Table(t) => out.extend(table_rows(t)),
                _ => {}
            }
        }

        Ok(out)
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    push_children(&mut text, &paragraph.children);
    text
}

/// Hyperlinks and tracked insertions wrap their own runs. Deletions are
/// skipped so only the accepted text remains.
fn push_children(text: &mut String, children: &[ParagraphChild]) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run(text, run),
            ParagraphChild::Hyperlink(link) => push_children(text, &link.children),
            ParagraphChild::Insert(insert) => {
                for insert_child in &insert.children {
                    if let InsertChild::Run(run) = insert_child {
                        push_run(text, run);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run(text: &mut String, run: &Run) {
    for run_child in &run.children {
        match run_child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push(' '),
            _ => {}
        }
    }
}

#[allow(irrefutable_let_patterns)]
fn table_rows(table: &Table) -> Vec<String> {
    let mut rows = Vec::new();
    for row in &table.rows {
        let docx_rs::TableChild::TableRow(row) = row else {
            continue;
        };

        let mut cells = Vec::new();
        for cell in &row.cells {
            let docx_rs::TableRowChild::TableCell(cell) = cell else {
                continue;
            };
            let text = cell
                .children
                .iter()
                .filter_map(|content| match content {
                    TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                    _ => None,
                })
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if !text.is_empty() {
                cells.push(text);
            }
        }

        if !cells.is_empty() {
            rows.push(cells.join(" | "));
        }
    }
    rows
}
