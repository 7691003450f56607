use std::{env, path::Path};

use split_engine::run;

fn main() {
    env_logger::init();

    let input = env::args()
        .nth(1)
        .expect("provide an expense ledger to read (.txt)");
    let output = env::args()
        .nth(2)
        .expect("provide a path to write settlement instructions to");

    run(Path::new(&input), Path::new(&output));
}
