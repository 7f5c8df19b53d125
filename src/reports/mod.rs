use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use gridforge::directory::KeyboardRecord;
use gridforge::parser::LayoutDefinition;
use gridforge::rewriter::RewriteReport;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn print_keyboard_list(records: &[KeyboardRecord]) {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Id").add_attribute(Attribute::Bold),
        Cell::new("Name"),
        Cell::new("Version"),
    ]);

    for record in records {
        table.add_row(vec![
            Cell::new(&record.id).fg(Color::Cyan),
            Cell::new(&record.name),
            Cell::new(record.version.as_deref().unwrap_or("-")),
        ]);
    }
    println!("{}", table);
}

/// One table per layer, keys down the left.
pub fn print_layout_mapping(definition: &LayoutDefinition) {
    println!(
        "\nLayout: {} ({})",
        definition.name.as_deref().unwrap_or("<unnamed>"),
        definition.format
    );

    for (layer, keys) in definition.mapping.layers() {
        println!("\nLayer '{}' [{}]", layer, layer.shift_token());
        let mut table = new_table();
        table.set_header(vec![Cell::new("Key"), Cell::new("Text")]);
        for (key, text) in keys {
            let shown = match text.as_str() {
                "" => Cell::new("(none)").fg(Color::DarkGrey),
                " " => Cell::new("(space)").fg(Color::DarkGrey),
                _ => Cell::new(text).set_alignment(CellAlignment::Center),
            };
            table.add_row(vec![Cell::new(key), shown]);
        }
        println!("{}", table);
    }
}

pub fn print_rewrite_report(report: &RewriteReport) {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Layer").add_attribute(Attribute::Bold),
        Cell::new("Cells"),
        Cell::new("Replaced").fg(Color::Green),
        Cell::new("Placeholder").fg(Color::Yellow),
        Cell::new("Space"),
        Cell::new("Reserved"),
        Cell::new("Unchanged"),
    ]);

    for i in 1..=6 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for layer in &report.layers {
        let Some(s) = &layer.stats else {
            table.add_row(vec![
                Cell::new(layer.folder).fg(Color::DarkGrey),
                Cell::new("-"),
            ]);
            continue;
        };
        table.add_row(vec![
            Cell::new(layer.folder),
            Cell::new(s.cells),
            Cell::new(s.replaced).fg(Color::Green),
            Cell::new(s.placeholders).fg(Color::Yellow),
            Cell::new(s.spaces),
            Cell::new(s.reserved),
            Cell::new(s.unchanged),
        ]);
    }

    let t = report.total();
    table.add_row(vec![
        Cell::new("TOTAL").add_attribute(Attribute::Bold),
        Cell::new(t.cells).add_attribute(Attribute::Bold),
        Cell::new(t.replaced),
        Cell::new(t.placeholders),
        Cell::new(t.spaces),
        Cell::new(t.reserved),
        Cell::new(t.unchanged),
    ]);
    println!("\n{}", table);
}
