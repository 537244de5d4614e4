use std::process;

use xlog_processor_lib::cli::{parse_args, parse_error_exit_code};
use xlog_processor_lib::commands::run_xlog_processor;

#[tokio::main]
async fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            let code = parse_error_exit_code(&err);
            let _ = err.print();
            process::exit(code);
        }
    };

    let code = run_xlog_processor(args).await;
    process::exit(code);
}
