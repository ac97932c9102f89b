// ABOUTME: PDF rendering of offer and contract snapshots
// ABOUTME: A4 pages with title, client block, line item table, totals and notes

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use robodesk_core::{ServiceError, ServiceResult};

use crate::inputs::RenderInputs;

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const LINE_HEIGHT: i64 = 14;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

// Table columns (x offsets)
const COL_DESCRIPTION: i64 = MARGIN;
const COL_QUANTITY: i64 = 300;
const COL_UNIT: i64 = 350;
const COL_UNIT_PRICE: i64 = 400;
const COL_TOTAL: i64 = 480;

const DESCRIPTION_CHARS: usize = 45;
const NOTES_WRAP_CHARS: usize = 90;

/// Render a document snapshot to PDF bytes
///
/// `generated_at` is printed in the header and stored as the creation date.
pub fn render_pdf(inputs: &RenderInputs, generated_at: DateTime<Utc>) -> ServiceResult<Vec<u8>> {
    let mut writer = PageWriter::new();
    let currency = inputs.currency.as_str();

    // Title block
    writer.text(
        MARGIN,
        18,
        BOLD,
        &format!("{} {}", inputs.document_kind.title(), inputs.document_number),
    );
    writer.next_line(LINE_HEIGHT + 8);
    writer.text(MARGIN, 12, REGULAR, &inputs.title);
    writer.next_line(LINE_HEIGHT);
    writer.text(
        MARGIN,
        9,
        REGULAR,
        &format!("Generated {}", generated_at.format("%Y-%m-%d %H:%M UTC")),
    );
    writer.next_line(LINE_HEIGHT * 2);

    // Client block
    writer.text(MARGIN, 11, BOLD, "Client");
    writer.next_line(LINE_HEIGHT);
    let client = &inputs.client;
    for value in [
        Some(client.name.as_str()),
        client.contact_person.as_deref(),
        client.email.as_deref(),
        client.address.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        writer.text(MARGIN, 10, REGULAR, value);
        writer.next_line(LINE_HEIGHT);
    }
    writer.next_line(LINE_HEIGHT);

    // Line items
    table_header(&mut writer);
    for item in &inputs.line_items {
        if writer.next_line(LINE_HEIGHT) {
            table_header(&mut writer);
            writer.next_line(LINE_HEIGHT);
        }
        writer.text(
            COL_DESCRIPTION,
            10,
            REGULAR,
            &truncate(&item.description, DESCRIPTION_CHARS),
        );
        writer.text(COL_QUANTITY, 10, REGULAR, &format_number(item.quantity));
        writer.text(COL_UNIT, 10, REGULAR, &truncate(&item.unit, 8));
        writer.text(COL_UNIT_PRICE, 10, REGULAR, &format!("{:.2}", item.unit_price));
        writer.text(COL_TOTAL, 10, REGULAR, &format!("{:.2} {}", item.total, currency));
    }
    if inputs.line_items.is_empty() {
        writer.next_line(LINE_HEIGHT);
        writer.text(COL_DESCRIPTION, 10, REGULAR, "No line items");
    }

    // Totals
    writer.next_line(LINE_HEIGHT * 2);
    writer.text(COL_UNIT_PRICE, 10, BOLD, "Subtotal");
    writer.text(
        COL_TOTAL,
        10,
        REGULAR,
        &format!("{:.2} {}", inputs.subtotal(), currency),
    );
    if let Some(total) = inputs.total {
        writer.next_line(LINE_HEIGHT);
        writer.text(COL_UNIT_PRICE, 10, BOLD, "Total");
        writer.text(COL_TOTAL, 10, BOLD, &format!("{:.2} {}", total, currency));
    }

    // Notes
    if let Some(notes) = inputs.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        writer.next_line(LINE_HEIGHT * 2);
        writer.text(MARGIN, 11, BOLD, "Notes");
        for line in wrap(notes, NOTES_WRAP_CHARS) {
            writer.next_line(LINE_HEIGHT);
            writer.text(MARGIN, 10, REGULAR, &line);
        }
    }

    build_document(
        writer.finish(),
        &format!("{} {}", inputs.document_kind.title(), inputs.document_number),
        generated_at,
    )
}

fn table_header(writer: &mut PageWriter) {
    writer.text(COL_DESCRIPTION, 10, BOLD, "Description");
    writer.text(COL_QUANTITY, 10, BOLD, "Qty");
    writer.text(COL_UNIT, 10, BOLD, "Unit");
    writer.text(COL_UNIT_PRICE, 10, BOLD, "Unit price");
    writer.text(COL_TOTAL, 10, BOLD, "Subtotal");
}

/// Accumulates text operations, starting a new page when the cursor runs out of room
struct PageWriter {
    pages: Vec<Vec<Operation>>,
    operations: Vec<Operation>,
    y: i64,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            operations: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    /// Move the cursor down; returns true when a page break happened
    fn next_line(&mut self, height: i64) -> bool {
        if self.y - height < MARGIN + LINE_HEIGHT {
            self.pages.push(std::mem::take(&mut self.operations));
            self.y = PAGE_HEIGHT - MARGIN;
            return true;
        }
        self.y -= height;
        false
    }

    fn text(&mut self, x: i64, size: i64, font: &str, value: &str) {
        push_text(&mut self.operations, x, self.y, size, font, value);
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.operations.is_empty() || self.pages.is_empty() {
            self.pages.push(self.operations);
        }

        let count = self.pages.len();
        for (index, page) in self.pages.iter_mut().enumerate() {
            push_text(
                page,
                PAGE_WIDTH - MARGIN - 60,
                MARGIN - 20,
                8,
                REGULAR,
                &format!("Page {} of {}", index + 1, count),
            );
        }
        self.pages
    }
}

fn push_text(ops: &mut Vec<Operation>, x: i64, y: i64, size: i64, font: &str, value: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(encode_text(value))],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn build_document(
    pages: Vec<Vec<Operation>>,
    title: &str,
    generated_at: DateTime<Utc>,
) -> ServiceResult<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular_id,
            BOLD => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| ServiceError::Internal(format!("Failed to encode PDF content: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let media_box: Vec<Object> = vec![0i64.into(), 0i64.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(encode_text(title)),
        "Producer" => Object::string_literal("Robodesk"),
        "CreationDate" => Object::string_literal(
            format!("D:{}Z", generated_at.format("%Y%m%d%H%M%S"))
        ),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ServiceError::Internal(format!("Failed to write PDF: {}", e)))?;
    Ok(buffer)
}

/// Encode for the WinAnsi base fonts; characters outside Latin-1 become `?`
fn encode_text(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| match u8::try_from(u32::from(c)) {
            Ok(byte) if !c.is_control() => byte,
            _ => b'?',
        })
        .collect()
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let kept: String = value.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Greedy word wrap; explicit newlines start a new line
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}
