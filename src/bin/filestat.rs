//! File status utility.
//!
//! Usage: filestat <path>
//!
//! Prints what the path is (regular file, directory, symlink, device, FIFO,
//! socket) without following symlinks, or reports that it does not exist.

use std::fs::{ self, FileType };
use std::io::ErrorKind;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn describe(file_type: FileType) -> &'static str {
    // Symlink first: symlink_metadata means we classify the link itself.
    if file_type.is_symlink() {
        return "is a symlink";
    }
    if file_type.is_dir() {
        return "is a directory";
    }
    if file_type.is_file() {
        return "is a regular file";
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        if file_type.is_block_device() {
            return "is a block device";
        }
        if file_type.is_char_device() {
            return "is a character device";
        }
        if file_type.is_fifo() {
            return "is a named IPC pipe";
        }
        if file_type.is_socket() {
            return "is a named IPC socket";
        }
    }

    "has `unknown` type"
}

fn check_status(path: &str) -> bool {
    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            println!("{:?} {}", path, describe(metadata.file_type()));
            true
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            println!("{:?} does not exist", path);
            true
        }
        Err(err) => {
            eprintln!("filestat: cannot stat {:?}: {}", path, err);
            false
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber
        ::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Error. Too few arguments");
        eprintln!("Usage: filestat <path>");
        return ExitCode::FAILURE;
    }
    if args.len() > 2 {
        eprintln!("Error. Too many arguments");
        eprintln!("Usage: filestat <path>");
        return ExitCode::FAILURE;
    }

    if check_status(&args[1]) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
