//! Host-side smoke run: format a fresh partition in the working directory
//! and exercise every operation once.

use std::io::{self, Write};
use std::process::ExitCode;

use log::error;
use partfs::layout::PARTITION_NAME;
use partfs::{EntryKind, FatVolume, FileDisk, FsOps, FsResult, ListEntry};

fn print_listing(header: &str, listing: &[ListEntry]) {
    println!("Listing of '{}':", header);
    println!("Type  Size      Name");
    println!("----  --------  ------------------");
    for entry in listing {
        let tag = match entry.kind {
            EntryKind::Dir => "[D]",
            EntryKind::File => "[F]",
        };
        println!(
            "{:<4}  {:<8}  {}",
            tag,
            entry.size,
            String::from_utf8_lossy(entry.name())
        );
    }
}

fn run() -> FsResult<()> {
    let disk = FileDisk::create(PARTITION_NAME)?;
    let mut fs = FatVolume::new(disk);

    fs.format()?;
    fs.load()?;

    fs.mkdir("/docs")?;
    fs.create("/docs/hello.txt")?;
    fs.write("/docs/hello.txt", b"Hello, world!")?;

    print!("read /docs/hello.txt: ");
    let mut stdout = io::stdout();
    fs.read_to("/docs/hello.txt", &mut stdout)?;
    // presentation newline after the file content
    println!();
    stdout.flush()?;

    fs.append("/docs/hello.txt", b" Appended.")?;
    let content = fs.read("/docs/hello.txt")?;
    assert_eq!(content, b"Hello, world! Appended.");

    fs.create("/scratch")?;
    print_listing("/", &fs.ls("/")?);
    print_listing("/docs", &fs.ls("/docs")?);

    fs.unlink("/scratch")?;
    fs.unlink("/docs/hello.txt")?;
    fs.unlink("/docs")?;
    assert!(fs.ls("/")?.is_empty());

    println!("fs-smoke: ok ({})", PARTITION_NAME);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("fs-smoke: {}", err);
            ExitCode::FAILURE
        }
    }
}
