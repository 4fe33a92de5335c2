use std::env;
use std::process;

use heapdb::execution::{drain, Operator};
use heapdb::{Database, DatabaseConfig, Result};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("usage: {} <schema-file> [table]", args[0]);
        process::exit(2);
    }

    // A bad catalog invalidates everything after it
    let db = match Database::open(&args[1], DatabaseConfig::default()) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to load catalog {}: {}", args[1], e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&db, args.get(2).map(String::as_str)) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(db: &Database, only: Option<&str>) -> Result<()> {
    let catalog = db.catalog();
    let table_ids = match only {
        Some(name) => vec![catalog.table_id(name)?],
        None => catalog.table_ids(),
    };

    let txn = db.begin();
    for table_id in table_ids {
        let name = catalog.table_name(table_id)?;
        let desc = catalog.tuple_desc(table_id)?;
        println!("{} ({})", name, desc);

        let mut scan = db.scan(txn, &name)?;
        scan.open()?;
        let tuples = drain(&mut scan)?;
        scan.close();
        for tuple in &tuples {
            println!("{}", tuple);
        }

        let file = catalog.file(table_id)?;
        println!(
            "-- {} tuples, {} pages, {} page reads\n",
            tuples.len(),
            file.num_pages()?,
            file.num_reads()
        );
    }
    db.commit(txn)
}
