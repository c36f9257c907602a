use std::env;
use std::path::Path;

use dairy_stats::extract::abs_historic::{HEADER_SCAN_ROWS, HEADER_SENTINEL};
use dairy_stats::extract::cells::{cell, cell_text, last_position};
use dairy_stats::extract::layout::find_sentinel;
use dairy_stats::extract::Workbook;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let file_path = if args.len() > 1 {
        &args[1]
    } else {
        "data/raw/abares/acs2018_dairy.xlsx"
    };

    println!("Opening workbook: {file_path}");
    let workbook = Workbook::open(Path::new(file_path))?;

    println!("\nSheet names:");
    for (i, name) in workbook.sheet_names().iter().enumerate() {
        println!("  {i}: {name}");
    }

    // Default to the first sheet
    let sheet_name = match args.get(2) {
        Some(name) => name.clone(),
        None => match workbook.sheet_names().first() {
            Some(name) => name.to_string(),
            None => {
                println!("Workbook has no readable sheets");
                return Ok(());
            }
        },
    };

    let (resolved, range) = workbook.sheet(&sheet_name)?;
    println!("\n\nExamining sheet: {resolved}");
    println!("{}", "=".repeat(100));

    println!("Dimensions: {:?} starting at {:?}", range.get_size(), range.start());
    println!("\nFirst 40 rows (showing first 10 columns, numbered as in the sheet):");
    println!("{}", "=".repeat(100));

    let Some((last_row, last_col)) = last_position(range) else {
        println!("Sheet is empty");
        return Ok(());
    };

    for row in 0..=last_row.min(39) {
        let cells: Vec<Option<String>> = (0..=last_col.min(9))
            .map(|col| cell(range, row, col).and_then(cell_text).filter(|t| !t.is_empty()))
            .collect();
        // Only print rows with data
        if cells.iter().all(Option::is_none) {
            continue;
        }
        print!("Row {:3}: ", row + 1);
        for text in &cells {
            match text {
                Some(text) => print!("[{text}] "),
                None => print!("[empty] "),
            }
        }
        println!();
    }

    println!("\n{}", "=".repeat(100));
    match find_sentinel(range, HEADER_SENTINEL, HEADER_SCAN_ROWS) {
        Some((row, col)) => println!(
            "\"{HEADER_SENTINEL}\" found at row {}, column {}",
            row + 1,
            col + 1
        ),
        None => println!("\"{HEADER_SENTINEL}\" not found in the first {HEADER_SCAN_ROWS} rows"),
    }

    Ok(())
}
