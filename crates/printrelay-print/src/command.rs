// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print settings → print-mechanism command translation.
//
// Two command syntaxes exist:
//
//   - POSIX `lp` (Linux, macOS): space-separated options.
//       duplex       -o sides=one-sided | two-sided-short-edge | two-sided-long-edge
//       copies > 1   -n <N>
//       orientation  -o portrait|landscape -o orientation-requested=3|4
//
//   - SumatraPDF `-print-settings` (Windows): comma-separated tokens.
//       duplex       simplex | duplexshort | duplexlong
//       copies > 1   <N>x
//       orientation  portrait | landscape
//
// Absent settings emit nothing.  Printer names and file paths are always
// quoted as whole arguments; every embedded quote is escaped so it cannot
// close the quoted argument.  The process itself is spawned from the argv
// vector, never through a shell; the rendered command line exists for logs.

use std::fmt;
use std::path::{Path, PathBuf};

use printrelay_core::config::PrintConfig;
use printrelay_core::error::{PrintRelayError, Result};
use printrelay_core::types::{Duplex, Orientation, PrintSettings};

/// Binary name of the POSIX print utility.
pub const LP_PROGRAM: &str = "lp";

/// File name of the bundled Windows PDF print helper.
pub const SUMATRA_EXE: &str = "SumatraPDF.exe";

// ---------------------------------------------------------------------------
// Platform lookup
// ---------------------------------------------------------------------------

/// Host platforms with a known print mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Look up a platform by its `std::env::consts::OS` name.
    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::MacOs),
            "windows" => Ok(Self::Windows),
            other => Err(PrintRelayError::UnsupportedPlatform(format!(
                "no print mechanism known for '{other}'"
            ))),
        }
    }

    pub fn syntax(&self) -> CommandSyntax {
        match self {
            Self::Linux | Self::MacOs => CommandSyntax::Posix,
            Self::Windows => CommandSyntax::Comma,
        }
    }
}

/// The two settings syntaxes understood by the supported print mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSyntax {
    /// `lp` options, space-joined.
    Posix,
    /// SumatraPDF print settings, comma-joined.
    Comma,
}

impl CommandSyntax {
    /// Render `settings` in this syntax.
    pub fn translate(&self, settings: &PrintSettings) -> String {
        match self {
            Self::Posix => settings_to_lp_format(settings),
            Self::Comma => settings_to_sumatra_format(settings),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings translation
// ---------------------------------------------------------------------------

fn lp_sides(duplex: Duplex) -> &'static str {
    match duplex {
        Duplex::Simplex => "one-sided",
        Duplex::ShortEdge => "two-sided-short-edge",
        Duplex::LongEdge => "two-sided-long-edge",
    }
}

/// IPP `orientation-requested` enum value (RFC 8011 §5.2.10).
fn orientation_requested(orientation: Orientation) -> u8 {
    match orientation {
        Orientation::Portrait => 3,
        Orientation::Landscape => 4,
    }
}

fn sumatra_duplex(duplex: Duplex) -> &'static str {
    match duplex {
        Duplex::Simplex => "simplex",
        Duplex::ShortEdge => "duplexshort",
        Duplex::LongEdge => "duplexlong",
    }
}

/// `lp` option arguments for `settings`, one argv entry per token.
pub fn settings_to_lp_args(settings: &PrintSettings) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(duplex) = settings.duplex {
        args.push("-o".to_owned());
        args.push(format!("sides={}", lp_sides(duplex)));
    }
    if let Some(copies) = settings.extra_copies() {
        args.push("-n".to_owned());
        args.push(copies.to_string());
    }
    if let Some(orientation) = settings.orientation {
        args.push("-o".to_owned());
        args.push(orientation.as_str().to_owned());
        args.push("-o".to_owned());
        args.push(format!("orientation-requested={}", orientation_requested(orientation)));
    }
    args
}

/// `lp` options for `settings` as a single space-joined string.
pub fn settings_to_lp_format(settings: &PrintSettings) -> String {
    settings_to_lp_args(settings).join(" ")
}

/// SumatraPDF `-print-settings` value for `settings`.
pub fn settings_to_sumatra_format(settings: &PrintSettings) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(duplex) = settings.duplex {
        parts.push(sumatra_duplex(duplex).to_owned());
    }
    if let Some(copies) = settings.extra_copies() {
        parts.push(format!("{copies}x"));
    }
    if let Some(orientation) = settings.orientation {
        parts.push(orientation.as_str().to_owned());
    }
    parts.join(",")
}

// ---------------------------------------------------------------------------
// Quoting
// ---------------------------------------------------------------------------

/// Quote `value` as one double-quoted POSIX shell word.
///
/// Every `\`, `"`, `$` and backtick is backslash-escaped, so nothing inside
/// the value can end the word or trigger expansion.
pub fn quote_posix(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Quote `value` as one Windows command-line argument
/// (`CommandLineToArgvW` rules).
///
/// Backslashes are only special before a quote: a run of N backslashes
/// followed by `"` becomes 2N+1 backslashes and `\"`, and a trailing run is
/// doubled so it cannot escape the closing quote.
pub fn quote_windows(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut backslashes = 0usize;
    for c in value.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                out.extend(std::iter::repeat_n('\\', backslashes * 2 + 1));
                out.push('"');
                backslashes = 0;
            }
            _ => {
                out.extend(std::iter::repeat_n('\\', backslashes));
                out.push(c);
                backslashes = 0;
            }
        }
    }
    out.extend(std::iter::repeat_n('\\', backslashes * 2));
    out.push('"');
    out
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// One argument of a print command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Fixed option text produced by the translator; rendered verbatim.
    Flag(String),
    /// Caller-supplied value (printer name, file path, settings string);
    /// always rendered quoted.
    Quoted(String),
}

impl Arg {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Flag(s) | Self::Quoted(s) => s,
        }
    }
}

/// A fully built print-mechanism invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintCommand {
    pub program: PathBuf,
    pub args: Vec<Arg>,
    pub syntax: CommandSyntax,
}

impl PrintCommand {
    /// Argument vector handed to the process spawner.
    pub fn argv(&self) -> Vec<&str> {
        self.args.iter().map(Arg::as_str).collect()
    }

    /// The program name as it appears in error messages.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Human-readable, shell-quoted command line.
    pub fn command_line(&self) -> String {
        let quote = match self.syntax {
            CommandSyntax::Posix => quote_posix,
            CommandSyntax::Comma => quote_windows,
        };
        let program = self.program.to_string_lossy();
        let mut line = if program.chars().any(|c| c.is_whitespace() || c == '"') {
            quote(&program)
        } else {
            program.into_owned()
        };
        for arg in &self.args {
            line.push(' ');
            match arg {
                Arg::Flag(flag) => line.push_str(flag),
                Arg::Quoted(value) => line.push_str(&quote(value)),
            }
        }
        line
    }
}

impl fmt::Display for PrintCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Builds the print-mechanism invocation for one file.
pub trait CommandTranslator: Send + Sync {
    fn syntax(&self) -> CommandSyntax;

    fn build(&self, file: &Path, printer: &str, settings: &PrintSettings) -> PrintCommand;
}

/// `lp [options] -d "<printer>" "<file>"`
#[derive(Debug, Clone, Default)]
pub struct LpTranslator;

impl CommandTranslator for LpTranslator {
    fn syntax(&self) -> CommandSyntax {
        CommandSyntax::Posix
    }

    fn build(&self, file: &Path, printer: &str, settings: &PrintSettings) -> PrintCommand {
        let mut args: Vec<Arg> = settings_to_lp_args(settings).into_iter().map(Arg::Flag).collect();
        args.push(Arg::Flag("-d".into()));
        args.push(Arg::Quoted(printer.to_owned()));
        args.push(Arg::Quoted(file.to_string_lossy().into_owned()));
        PrintCommand {
            program: PathBuf::from(LP_PROGRAM),
            args,
            syntax: CommandSyntax::Posix,
        }
    }
}

/// `"SumatraPDF.exe" -print-to "<printer>" [-print-settings "<s>"] -silent "<file>"`
#[derive(Debug, Clone)]
pub struct SumatraTranslator {
    binary: PathBuf,
}

impl SumatraTranslator {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl CommandTranslator for SumatraTranslator {
    fn syntax(&self) -> CommandSyntax {
        CommandSyntax::Comma
    }

    fn build(&self, file: &Path, printer: &str, settings: &PrintSettings) -> PrintCommand {
        let mut args = vec![Arg::Flag("-print-to".into()), Arg::Quoted(printer.to_owned())];
        let print_settings = settings_to_sumatra_format(settings);
        if !print_settings.is_empty() {
            args.push(Arg::Flag("-print-settings".into()));
            args.push(Arg::Quoted(print_settings));
        }
        args.push(Arg::Flag("-silent".into()));
        args.push(Arg::Quoted(file.to_string_lossy().into_owned()));
        PrintCommand {
            program: self.binary.clone(),
            args,
            syntax: CommandSyntax::Comma,
        }
    }
}

/// Architecture directory name used by the bundled helper layout.
pub fn bundle_arch(arch: &str) -> Result<&'static str> {
    match arch {
        "x86" => Ok("ia32"),
        "x86_64" => Ok("x64"),
        "aarch64" => Ok("arm64"),
        other => Err(PrintRelayError::UnsupportedPlatform(format!(
            "no bundled print helper for architecture '{other}'"
        ))),
    }
}

/// Location of the bundled SumatraPDF for `arch` under `resources_dir`.
pub fn bundled_sumatra_path(resources_dir: &Path, arch: &str) -> Result<PathBuf> {
    Ok(resources_dir
        .join("external")
        .join("win32")
        .join(bundle_arch(arch)?)
        .join(SUMATRA_EXE))
}

/// Default resources directory: `resources/` next to the running binary.
pub fn default_resources_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe
        .parent()
        .ok_or_else(|| PrintRelayError::Config(format!("{} has no parent dir", exe.display())))?;
    Ok(dir.join("resources"))
}

/// Pick the translator for `platform`.
pub fn translator_for(platform: Platform, config: &PrintConfig) -> Result<Box<dyn CommandTranslator>> {
    match platform {
        Platform::Linux | Platform::MacOs => Ok(Box::new(LpTranslator)),
        Platform::Windows => {
            let binary = match &config.sumatra_path {
                Some(path) => path.clone(),
                None => {
                    let resources = match &config.resources_dir {
                        Some(dir) => dir.clone(),
                        None => default_resources_dir()?,
                    };
                    bundled_sumatra_path(&resources, std::env::consts::ARCH)?
                }
            };
            Ok(Box::new(SumatraTranslator::new(binary)))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;

    fn settings(duplex: Option<Duplex>, copies: u32, orientation: Option<Orientation>) -> PrintSettings {
        PrintSettings {
            duplex,
            copies: NonZeroU32::new(copies),
            orientation,
        }
    }

    fn expected_lp(duplex: Option<Duplex>, copies: u32, orientation: Option<Orientation>) -> String {
        let mut tokens = Vec::new();
        match duplex {
            Some(Duplex::Simplex) => tokens.push("-o sides=one-sided".to_owned()),
            Some(Duplex::ShortEdge) => tokens.push("-o sides=two-sided-short-edge".to_owned()),
            Some(Duplex::LongEdge) => tokens.push("-o sides=two-sided-long-edge".to_owned()),
            None => {}
        }
        if copies > 1 {
            tokens.push(format!("-n {copies}"));
        }
        match orientation {
            Some(Orientation::Portrait) => {
                tokens.push("-o portrait -o orientation-requested=3".to_owned())
            }
            Some(Orientation::Landscape) => {
                tokens.push("-o landscape -o orientation-requested=4".to_owned())
            }
            None => {}
        }
        tokens.join(" ")
    }

    fn expected_sumatra(duplex: Option<Duplex>, copies: u32, orientation: Option<Orientation>) -> String {
        let mut tokens = Vec::new();
        match duplex {
            Some(Duplex::Simplex) => tokens.push("simplex".to_owned()),
            Some(Duplex::ShortEdge) => tokens.push("duplexshort".to_owned()),
            Some(Duplex::LongEdge) => tokens.push("duplexlong".to_owned()),
            None => {}
        }
        if copies > 1 {
            tokens.push(format!("{copies}x"));
        }
        if let Some(o) = orientation {
            tokens.push(o.as_str().to_owned());
        }
        tokens.join(",")
    }

    #[test]
    fn every_settings_combination_translates_in_both_syntaxes() {
        let duplexes = std::iter::once(None).chain(Duplex::ALL.map(Some));
        for duplex in duplexes {
            for copies in [1, 2, 5] {
                let orientations = std::iter::once(None).chain(Orientation::ALL.map(Some));
                for orientation in orientations {
                    let s = settings(duplex, copies, orientation);
                    assert_eq!(
                        CommandSyntax::Posix.translate(&s),
                        expected_lp(duplex, copies, orientation),
                        "posix {duplex:?} {copies} {orientation:?}"
                    );
                    assert_eq!(
                        CommandSyntax::Comma.translate(&s),
                        expected_sumatra(duplex, copies, orientation),
                        "comma {duplex:?} {copies} {orientation:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn empty_settings_emit_nothing() {
        let s = PrintSettings::default();
        assert_eq!(settings_to_lp_format(&s), "");
        assert_eq!(settings_to_sumatra_format(&s), "");
        assert!(settings_to_lp_args(&s).is_empty());
    }

    #[test]
    fn lp_args_keep_option_and_value_separate() {
        let s = settings(Some(Duplex::LongEdge), 2, Some(Orientation::Landscape));
        assert_eq!(
            settings_to_lp_args(&s),
            vec![
                "-o",
                "sides=two-sided-long-edge",
                "-n",
                "2",
                "-o",
                "landscape",
                "-o",
                "orientation-requested=4"
            ]
        );
    }

    #[test]
    fn lp_command_layout() {
        let cmd = LpTranslator.build(
            Path::new("/tmp/print_abc.pdf"),
            "Office Laser",
            &settings(None, 2, None),
        );
        assert_eq!(cmd.program, PathBuf::from("lp"));
        assert_eq!(cmd.argv(), vec!["-n", "2", "-d", "Office Laser", "/tmp/print_abc.pdf"]);
        assert_eq!(cmd.command_line(), r#"lp -n 2 -d "Office Laser" "/tmp/print_abc.pdf""#);
    }

    #[test]
    fn sumatra_command_layout() {
        let translator = SumatraTranslator::new(r"C:\Program Files\PrintRelay\SumatraPDF.exe");
        let cmd = translator.build(
            Path::new(r"C:\Temp\print_abc.pdf"),
            "HP LaserJet",
            &settings(Some(Duplex::ShortEdge), 3, Some(Orientation::Portrait)),
        );
        assert_eq!(
            cmd.argv(),
            vec![
                "-print-to",
                "HP LaserJet",
                "-print-settings",
                "duplexshort,3x,portrait",
                "-silent",
                r"C:\Temp\print_abc.pdf"
            ]
        );
        assert_eq!(
            cmd.command_line(),
            r#""C:\Program Files\PrintRelay\SumatraPDF.exe" -print-to "HP LaserJet" -print-settings "duplexshort,3x,portrait" -silent "C:\Temp\print_abc.pdf""#
        );
    }

    #[test]
    fn sumatra_omits_empty_print_settings() {
        let cmd = SumatraTranslator::new("SumatraPDF.exe").build(
            Path::new("doc.pdf"),
            "P",
            &PrintSettings::default(),
        );
        assert_eq!(cmd.argv(), vec!["-print-to", "P", "-silent", "doc.pdf"]);
    }

    /// Split a POSIX double-quoted word back out of a command line.
    fn unquote_posix_word(s: &str) -> (String, &str) {
        let mut chars = s.char_indices();
        assert_eq!(chars.next().map(|(_, c)| c), Some('"'));
        let mut out = String::new();
        let mut escaped = false;
        for (i, c) in chars {
            if escaped {
                out.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                return (out, &s[i + 1..]);
            } else {
                out.push(c);
            }
        }
        panic!("unterminated word in {s:?}");
    }

    #[test]
    fn quote_in_printer_name_cannot_close_the_argument() {
        let hostile = r#"P1" ; rm -rf / ; echo ""#;
        let cmd = LpTranslator.build(Path::new("/tmp/a.pdf"), hostile, &PrintSettings::default());
        let line = cmd.command_line();

        let rest = line.strip_prefix("lp -d ").unwrap();
        let (printer, rest) = unquote_posix_word(rest);
        assert_eq!(printer, hostile);
        let (file, rest) = unquote_posix_word(rest.trim_start());
        assert_eq!(file, "/tmp/a.pdf");
        assert!(rest.is_empty());

        // The spawned argv carries the name untouched as a single argument.
        assert_eq!(cmd.argv()[1], hostile);
    }

    #[test]
    fn every_quote_is_escaped_not_just_the_first() {
        assert_eq!(quote_posix(r#"a"b"c"#), r#""a\"b\"c""#);
        assert_eq!(quote_posix("$(id)`x`"), r#""\$(id)\`x\`""#);
        assert_eq!(quote_posix(r"back\slash"), r#""back\\slash""#);
    }

    #[test]
    fn windows_quoting_follows_argv_rules() {
        assert_eq!(quote_windows("HP LaserJet"), r#""HP LaserJet""#);
        assert_eq!(quote_windows(r#"P1" -exit-on-print ""#), r#""P1\" -exit-on-print \"""#);
        assert_eq!(quote_windows(r"C:\dir\"), r#""C:\dir\\""#);
        assert_eq!(quote_windows(r#"a\"b"#), r#""a\\\"b""#);
    }

    #[test]
    fn unknown_platform_is_an_error() {
        assert_eq!(Platform::from_os("linux").unwrap(), Platform::Linux);
        assert_eq!(Platform::from_os("macos").unwrap().syntax(), CommandSyntax::Posix);
        assert_eq!(Platform::from_os("windows").unwrap().syntax(), CommandSyntax::Comma);
        assert!(matches!(
            Platform::from_os("freebsd"),
            Err(PrintRelayError::UnsupportedPlatform(_))
        ));
    }

    #[test]
    fn bundled_helper_path_per_arch() {
        let path = bundled_sumatra_path(Path::new("/opt/printrelay"), "x86_64").unwrap();
        assert_eq!(
            path,
            Path::new("/opt/printrelay/external/win32/x64/SumatraPDF.exe")
        );
        assert!(bundled_sumatra_path(Path::new("/opt"), "riscv64").is_err());
    }

    #[test]
    fn windows_translator_honours_explicit_helper_path() {
        let config = PrintConfig {
            sumatra_path: Some(PathBuf::from(r"D:\tools\SumatraPDF.exe")),
            ..Default::default()
        };
        let translator = translator_for(Platform::Windows, &config).unwrap();
        assert_eq!(translator.syntax(), CommandSyntax::Comma);
        let cmd = translator.build(Path::new("x.pdf"), "P", &PrintSettings::default());
        assert_eq!(cmd.program, PathBuf::from(r"D:\tools\SumatraPDF.exe"));
    }

    #[test]
    fn posix_translator_uses_lp() {
        let translator = translator_for(Platform::MacOs, &PrintConfig::default()).unwrap();
        let cmd = translator.build(Path::new("x.pdf"), "P", &PrintSettings::default());
        assert_eq!(cmd.program_name(), "lp");
    }
}
