//! Print the header, type table and object table of an assets file.
//!
//! Usage: `cargo run --example list_objects -- <path/to/file.assets>`

use std::env;
use std::process;

use veles::prelude::*;

fn main() -> veles::Result<()> {
    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: list_objects <assets file>");
        process::exit(2);
    };

    let file = AssetsFile::open(&path)?;
    let header = file.header();

    println!("{}", path);
    println!("  Unity version:  {}", file.version());
    println!("  Format:         {}", file.format());
    println!("  Platform:       {}", file.platform());
    println!("  Header endian:  {:?}", header.endian);
    println!("  Data offset:    {:#x}", header.data_offset);
    println!("  File size:      {}", header.file_size);
    println!("  Long IDs:       {}", file.long_object_ids());

    let meta = file.type_metadata();
    println!("\nTypes ({}, trees: {})", meta.classes().len(), meta.has_type_trees());
    for class in meta.classes() {
        let fields = meta
            .type_tree(class.class_id)
            .map(|tree| tree.node_count())
            .unwrap_or(0);
        println!("  class {:>5} script {:>4} nodes {:>4}", class.class_id, class.script_id, fields);
    }

    println!("\nObjects ({})", file.len());
    for object in file.objects() {
        let info = object.info();
        println!(
            "  {:>20} class {:>5} offset {:>10} size {:>8}{}",
            info.path_id,
            info.class_id,
            info.data_offset,
            info.size,
            if info.is_destroyed { " (destroyed)" } else { "" }
        );
    }

    if !file.references().is_empty() {
        println!("\nExternal references ({})", file.references().len());
        for reference in file.references() {
            println!("  {} {} type {}", reference.guid, reference.file_path, reference.ref_type);
        }
    }

    Ok(())
}
