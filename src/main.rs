use std::process::ExitCode;

fn main() -> ExitCode {
    let result = feed_advancer::app::start();
    match result {
        Ok(..) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}
