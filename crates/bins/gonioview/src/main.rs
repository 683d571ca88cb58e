#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod app;

fn main() {
    std::process::exit(match app::run() {
        Ok(_) => 0,
        Err(ref e) => {
            eprintln!("{}", e);
            1
        },
    })
}
