use std::io::BufWriter;

use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};
use tracing::debug;

use crate::config::Company;
use crate::error::{InvoiceError, Result};
use crate::format::{pdf_amount, percent, quantity};
use crate::invoice::InvoiceRecord;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const LEFT: f32 = 20.0;
const RIGHT: f32 = 190.0;
const TOP: f32 = 277.0;
const BOTTOM: f32 = 25.0;
const LINE_HEIGHT: f32 = 5.0;

// Item table columns
const X_DESC: f32 = LEFT;
const X_QTY: f32 = 118.0;
const X_PRICE: f32 = 140.0;
const X_AMOUNT: f32 = 166.0;
const DESC_WRAP: usize = 52;
const TABLE_HEADER_HEIGHT: f32 = 8.5;

// Totals block
const X_TOTAL_LABEL: f32 = 130.0;
const X_TOTAL_VALUE: f32 = 166.0;

const NOTES_WRAP: usize = 95;

/// Current page plus the fonts and cursor used while laying out a document
struct Canvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    /// Lowest baseline any text was drawn at
    lowest: f32,
    pages: usize,
}

impl Canvas {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: TOP,
            lowest: TOP,
            pages: 1,
        })
    }

    fn text(&mut self, text: &str, size: f32, x: f32) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), &self.regular);
        self.lowest = self.lowest.min(self.y);
    }

    fn bold_text(&mut self, text: &str, size: f32, x: f32) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), &self.bold);
        self.lowest = self.lowest.min(self.y);
    }

    fn rule(&self) {
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(LEFT), Mm(self.y)), false),
                (Point::new(Mm(RIGHT), Mm(self.y)), false),
            ],
            is_closed: false,
        });
    }

    fn advance(&mut self, by: f32) {
        self.y -= by;
    }

    /// Start a new page when fewer than `height` mm remain. Returns true on a break.
    fn ensure_space(&mut self, height: f32) -> bool {
        if self.y - height >= BOTTOM {
            return false;
        }
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            format!("Layer {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP;
        true
    }

    fn finish(self) -> Result<Vec<u8>> {
        let mut writer = BufWriter::new(Vec::<u8>::new());
        self.doc.save(&mut writer).map_err(pdf_error)?;
        writer
            .into_inner()
            .map_err(|e| InvoiceError::PdfGeneration(e.to_string()))
    }
}

fn pdf_error(e: impl std::fmt::Display) -> InvoiceError {
    InvoiceError::PdfGeneration(e.to_string())
}

/// Render the invoice as a PDF document. Long item lists continue on
/// further pages with the table header repeated.
pub fn render_pdf(record: &InvoiceRecord, company: &Company) -> Result<Vec<u8>> {
    let canvas = layout(record, company)?;
    debug!(pages = canvas.pages, items = record.items.len(), "Rendered invoice PDF");
    canvas.finish()
}

fn layout(record: &InvoiceRecord, company: &Company) -> Result<Canvas> {
    let mut canvas = Canvas::new(&format!("Invoice {}", record.invoice_number))?;

    draw_header(&mut canvas, record);
    draw_parties(&mut canvas, record, company);
    draw_items(&mut canvas, record);
    draw_totals(&mut canvas, record);
    draw_notes(&mut canvas, &record.notes);

    Ok(canvas)
}

fn draw_header(canvas: &mut Canvas, record: &InvoiceRecord) {
    canvas.bold_text("INVOICE", 24.0, LEFT);
    canvas.advance(10.0);

    for (label, value) in [
        ("Invoice #:", record.invoice_number.as_str()),
        ("Date:", record.date.as_str()),
        ("Due Date:", record.due_date.as_str()),
    ] {
        canvas.bold_text(label, 10.0, LEFT);
        canvas.text(value, 10.0, LEFT + 22.0);
        canvas.advance(LINE_HEIGHT);
    }

    canvas.advance(5.0);
}

fn draw_parties(canvas: &mut Canvas, record: &InvoiceRecord, company: &Company) {
    const X_BILL_TO: f32 = 110.0;

    let mut from = vec![company.name.clone()];
    from.extend(company.lines.iter().cloned());
    from.extend(company.email.iter().cloned());

    let mut bill_to = vec![record.customer_name.clone()];
    bill_to.extend(address_lines(&record.customer_address));
    if !record.customer_email.is_empty() {
        bill_to.push(record.customer_email.clone());
    }

    let labels = |canvas: &mut Canvas| {
        canvas.bold_text("From:", 11.0, LEFT);
        canvas.bold_text("Bill To:", 11.0, X_BILL_TO);
        canvas.advance(6.0);
    };

    canvas.ensure_space(6.0 + LINE_HEIGHT);
    labels(canvas);

    for row in 0..from.len().max(bill_to.len()) {
        if canvas.ensure_space(LINE_HEIGHT) {
            labels(canvas);
        }
        if let Some(line) = from.get(row) {
            canvas.text(line, 10.0, LEFT);
        }
        if let Some(line) = bill_to.get(row) {
            canvas.text(line, 10.0, X_BILL_TO);
        }
        canvas.advance(LINE_HEIGHT);
    }

    canvas.advance(5.0);
}

fn draw_table_header(canvas: &mut Canvas) {
    canvas.bold_text("Description", 10.0, X_DESC);
    canvas.bold_text("Quantity", 10.0, X_QTY);
    canvas.bold_text("Unit Price", 10.0, X_PRICE);
    canvas.bold_text("Amount", 10.0, X_AMOUNT);
    canvas.advance(2.5);
    canvas.rule();
    canvas.advance(TABLE_HEADER_HEIGHT - 2.5);
}

fn draw_items(canvas: &mut Canvas, record: &InvoiceRecord) {
    canvas.ensure_space(TABLE_HEADER_HEIGHT + LINE_HEIGHT);
    draw_table_header(canvas);

    for item in &record.items {
        let lines = wrap(&item.description, DESC_WRAP);
        let height = lines.len().max(1) as f32 * LINE_HEIGHT + 1.0;

        if canvas.ensure_space(height) {
            draw_table_header(canvas);
        }

        canvas.text(&quantity(item.quantity), 10.0, X_QTY);
        canvas.text(&pdf_amount(item.unit_price), 10.0, X_PRICE);
        canvas.text(&pdf_amount(item.amount), 10.0, X_AMOUNT);
        for line in &lines {
            canvas.text(line, 10.0, X_DESC);
            canvas.advance(LINE_HEIGHT);
        }
        if lines.is_empty() {
            canvas.advance(LINE_HEIGHT);
        }
        canvas.advance(1.0);
    }

    canvas.advance(1.5);
    canvas.rule();
    canvas.advance(8.0);
}

fn draw_totals(canvas: &mut Canvas, record: &InvoiceRecord) {
    canvas.ensure_space(3.0 * 6.0 + 4.0);

    let tax_label = format!("Tax ({}%):", percent(record.tax_rate));
    let rows = [
        ("Subtotal:", record.subtotal, false),
        (tax_label.as_str(), record.tax_amount, false),
        ("Total:", record.total, true),
    ];

    for (label, amount, emphasize) in rows {
        if emphasize {
            canvas.bold_text(label, 12.0, X_TOTAL_LABEL);
            canvas.bold_text(&pdf_amount(amount), 12.0, X_TOTAL_VALUE);
        } else {
            canvas.text(label, 10.0, X_TOTAL_LABEL);
            canvas.text(&pdf_amount(amount), 10.0, X_TOTAL_VALUE);
        }
        canvas.advance(6.0);
    }
}

fn draw_notes(canvas: &mut Canvas, notes: &str) {
    if notes.trim().is_empty() {
        return;
    }

    canvas.advance(6.0);
    canvas.ensure_space(2.0 * LINE_HEIGHT + 6.0);
    canvas.bold_text("Notes:", 11.0, LEFT);
    canvas.advance(6.0);

    for paragraph in notes.lines() {
        for line in wrap(paragraph, NOTES_WRAP) {
            canvas.ensure_space(LINE_HEIGHT);
            canvas.text(&line, 10.0, LEFT);
            canvas.advance(LINE_HEIGHT);
        }
    }
}

/// Split a customer address on commas, one trimmed segment per line
pub fn address_lines(address: &str) -> Vec<String> {
    address
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Greedy word wrap by character count; words longer than `width` are split
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
