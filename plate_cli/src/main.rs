use anyhow::Context;
use plate_core::{
    FileStore, PatternId, PlateFormat, Runtime, StyleKey, parse_well_id, stats, style, well_id,
};
use std::io::{self, Write};

fn print_help() {
    println!(
        r#"Commands:
  formats                 list the supported plate sizes
  format <size>           switch the active plate (6/12/24/48/96)
  show                    print the active grid
  select <id> [<id>...]   select wells, e.g. select A1 A2 B1
  select <a> thru <b>     select a run within one row or one column
  label <name> [style]    label the selection; style is a color like
                          #ef4444 or a pattern id like dots-small
  styles                  list preset colors and pattern ids
  cancel                  drop the current selection
  stats                   global legend across all plate sizes
  clear                   empty the active plate (asks first)
  quit
"#
    );
}

/// Expands "<a> thru <b>" into ids, walking one row left-to-right or one
/// column top-to-bottom. Both endpoints must share a row or a column.
fn expand_thru(format: PlateFormat, a: &str, b: &str) -> anyhow::Result<Vec<String>> {
    let (ar, ac) = parse_well_id(a).with_context(|| format!("bad well id '{a}'"))?;
    let (br, bc) = parse_well_id(b).with_context(|| format!("bad well id '{b}'"))?;

    let mut out = Vec::new();
    if ar == br {
        let (lo, hi) = if ac <= bc { (ac, bc) } else { (bc, ac) };
        for c in lo..=hi {
            out.push(well_id(ar, c));
        }
    } else if ac == bc {
        let (lo, hi) = if ar <= br { (ar, br) } else { (br, ar) };
        for r in lo..=hi {
            out.push(well_id(r, ac));
        }
    } else {
        anyhow::bail!("'{a} thru {b}' must stay within one row or one column");
    }

    let grid = plate_core::WellGrid::generate(format);
    for id in &out {
        if !grid.contains_id(id) {
            anyhow::bail!("well {id} does not exist on the {} plate", format.size());
        }
    }
    Ok(out)
}

/// A style argument is either a known pattern id or a color literal.
fn parse_style(token: &str) -> StyleKey {
    StyleKey::parse(token)
}

fn show_grid(rt: &Runtime) {
    let format = rt.active();
    let grid = rt.store.get(format);
    println!("{format}  ({} filled)", grid.filled_count());

    print!("    ");
    for c in 0..format.cols() {
        print!("{:>5}", c + 1);
    }
    println!();

    for r in 0..format.rows() {
        print!("  {} ", (b'A' + r as u8) as char);
        for c in 0..format.cols() {
            let id = well_id(r, c);
            let well = grid.well(&id).map(|w| w.display_text()).unwrap_or_default();
            if rt.selection.contains(&id) {
                print!("[{well:>3}]");
            } else {
                print!(" {well:>3} ");
            }
        }
        println!();
    }

    if !rt.selection.ids().is_empty() {
        println!("Selected: {}", rt.selection.ids().join(" "));
    }
}

fn show_stats(rt: &Runtime) {
    let legend = rt.legend();
    if legend.is_empty() {
        println!("No labeled wells yet.");
        return;
    }
    println!(
        "{} groups across all plates ({} legend columns):",
        legend.len(),
        stats::legend_columns(legend.len())
    );
    for entry in legend {
        println!(
            "  {:<16} {:<20} {:>3} wells",
            entry.label,
            entry.style.storage_key(),
            entry.count
        );
    }
}

fn show_styles() {
    println!("Preset colors:");
    for c in style::PRESET_COLORS {
        println!("  {c}");
    }
    println!("Patterns:");
    for p in PatternId::ALL {
        println!("  {:<20} {}", p.as_str(), p.display_name());
    }
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Drives one selection through the controller the same way the GUI does:
/// first id is the pointer-down, the rest are pointer-enters.
fn select(rt: &mut Runtime, ids: &[String]) {
    let mut iter = ids.iter();
    if let Some(first) = iter.next() {
        rt.pointer_down(first);
        for id in iter {
            rt.pointer_enter(id);
        }
        rt.pointer_up();
        println!("Selected {} wells.", rt.selection.ids().len());
    }
}

fn repl(data_dir: &str) -> anyhow::Result<()> {
    let blobs = FileStore::new(data_dir);
    println!(
        "Plate layouts are stored in {}",
        blobs.blob_path(plate_core::persist::STORE_KEY).display()
    );
    let mut rt = Runtime::new(Box::new(blobs));

    println!("Active plate: {}", rt.active());
    println!("Type 'help' for commands. 'quit' to exit.");

    loop {
        print!("plate> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            // EOF (Ctrl+D)
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "help" => print_help(),
            "quit" | "exit" => break,

            "formats" => {
                for f in PlateFormat::ALL {
                    let marker = if f == rt.active() { "*" } else { " " };
                    println!(" {marker} {f}");
                }
            }

            "format" => match parts.get(1).and_then(|s| s.parse::<u32>().ok()) {
                Some(size) => match PlateFormat::from_size(size) {
                    Some(f) => {
                        rt.set_active(f);
                        println!("Active plate: {f}");
                    }
                    None => println!("Supported sizes: 6, 12, 24, 48, 96."),
                },
                None => println!("Usage: format <size>"),
            },

            "show" => show_grid(&rt),

            "select" => {
                if parts.len() == 4 && parts[2].eq_ignore_ascii_case("thru") {
                    match expand_thru(rt.active(), parts[1], parts[3]) {
                        Ok(ids) => select(&mut rt, &ids),
                        Err(e) => println!("{e:#}"),
                    }
                } else if parts.len() >= 2 {
                    let grid = rt.store.get(rt.active());
                    let unknown: Vec<&&str> = parts[1..]
                        .iter()
                        .filter(|id| !grid.contains_id(id))
                        .collect();
                    if unknown.is_empty() {
                        let ids: Vec<String> = parts[1..].iter().map(|s| s.to_string()).collect();
                        select(&mut rt, &ids);
                    } else {
                        println!(
                            "No such well on the {} plate: {}",
                            rt.active().size(),
                            unknown
                                .iter()
                                .map(|s| s.to_string())
                                .collect::<Vec<_>>()
                                .join(" ")
                        );
                    }
                } else {
                    println!("Usage: select <id> [<id>...]  |  select <a> thru <b>");
                }
            }

            "label" => {
                if parts.len() < 2 {
                    println!("Usage: label <name> [style]");
                    continue;
                }
                // A trailing color or pattern id is the style, the rest is
                // the group name.
                let last = parts[parts.len() - 1];
                let (name_parts, style) = if parts.len() > 2
                    && (last.starts_with('#') || PatternId::from_str(last).is_some())
                {
                    (&parts[1..parts.len() - 1], Some(parse_style(last)))
                } else {
                    (&parts[1..], None)
                };
                let name = name_parts.join(" ");

                match rt.commit(&name, style) {
                    Ok(n) => println!("Labeled {n} wells as '{name}'."),
                    Err(e) => println!("{e}"),
                }
            }

            "styles" => show_styles(),

            "cancel" => {
                rt.cancel_selection();
                println!("Selection dropped.");
            }

            "stats" => show_stats(&rt),

            "clear" => {
                let prompt = format!("Clear the {}?", rt.active());
                if confirm(&prompt)? {
                    rt.clear_active();
                    println!("Cleared.");
                } else {
                    println!("Left alone.");
                }
            }

            _ => println!("Unknown command '{cmd}'. Type 'help'."),
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let data_dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());
    repl(&data_dir)
}
