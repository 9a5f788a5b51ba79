fn main() {
    if let Err(error) = pagespeed_dashboard_lib::run() {
        eprintln!("pagespeed-dashboard: {:#}", error);
        std::process::exit(1);
    }
}
