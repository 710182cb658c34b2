/// Delegates to nih_plug_xtask for the `bundle` subcommand. Usage:
///
///   cargo xtask bundle ensemble-echo --release
///
/// Both plugins live in the same library, so this produces a single
/// `target/bundled/ensemble-echo.vst3` and `.clap` exposing
/// "Triple Chorus" and "Regen Echo".
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
