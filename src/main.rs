fn main() -> std::process::ExitCode {
    mikiho_launcher_lib::run()
}
