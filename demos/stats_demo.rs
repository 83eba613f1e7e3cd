use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;

use clap::Parser;
use stable_swiss::Error;
use stable_swiss::HashTable;
use stable_swiss::hash_table::InsertMode;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    /// Percentage of the inserted values to remove before compacting.
    #[arg(short = 'r', long = "remove_percent", default_value_t = 50)]
    remove_percent: usize,
}

fn hash_u64(value: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn main() {
    let args = Args::parse();

    println!(
        "Creating HashTable with target capacity: {}",
        args.target_capacity
    );

    let mut table: HashTable<u64> = HashTable::with_capacity(args.target_capacity);

    println!(
        "Actual capacity: {} ({} usable)",
        table.capacity(),
        table.effective_capacity()
    );
    println!("Filling table with u64 values...");

    let mut value = 0u64;
    loop {
        let hash = hash_u64(value);
        match table.insert(hash, value, |&v| v == value, InsertMode::IfAbsent) {
            Ok(_) => value += 1,
            Err(Error::TableFull) => break,
            Err(e) => panic!("unexpected insert failure: {e}"),
        }
    }

    println!("Inserted {} values into table", table.len());
    println!(
        "Final load factor: {:.2}%",
        (table.len() as f64 / table.capacity() as f64) * 100.0
    );
    table.probe_histogram(|&v| hash_u64(v)).print();
    table.stats().print();

    let to_remove = table.len() as u64 * args.remove_percent.min(100) as u64 / 100;
    println!("\nRemoving {} values...", to_remove);
    for v in 0..to_remove {
        table.remove(hash_u64(v), |&x| x == v);
    }
    table.stats().print();

    println!("\nCompacting...");
    if let Err(e) = table.compact(|&v| hash_u64(v)) {
        eprintln!("compaction failed: {e}");
        std::process::exit(1);
    }
    table.probe_histogram(|&v| hash_u64(v)).print();
    table.stats().print();
}
