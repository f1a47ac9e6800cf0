use std::path::PathBuf;

use clap::Parser;
use log::debug;

pub const DEFAULT_OUTPUT: &str = "src-tauri/icons/icon.png";

/// Command line; every option can also come from the environment or `.env`.
#[derive(Debug, Default, Parser)]
#[command(name = "icongen", about = "Generate the 32x32 application icon")]
pub struct Args {
    /// Where to write the icon (the directory must exist)
    #[arg(env = "ICON_OUTPUT")]
    pub output: Option<PathBuf>,

    /// BDF font used for the label
    #[arg(long, env = "ICON_FONT")]
    pub font: Option<PathBuf>,

    /// JSON file overriding colors and label
    #[arg(long, env = "ICON_SPEC")]
    pub spec: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where the icon is written. The parent directory must already exist.
    pub output: PathBuf,
    /// BDF font used for the label.
    pub font_path: Option<PathBuf>,
    /// JSON file overriding the icon's colors and label.
    pub spec_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self { output: PathBuf::from(DEFAULT_OUTPUT), font_path: None, spec_path: None }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        // 空字符串当作没有设置
        let given = |path: Option<PathBuf>| path.filter(|p| !p.as_os_str().is_empty());

        Self {
            output: given(args.output).unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            font_path: given(args.font),
            spec_path: given(args.spec),
        }
    }
}

impl Config {
    /// 解析命令行和环境变量, `--help` 之类会在这里直接退出
    pub fn from_cli() -> Self {
        let config = Self::from(Args::parse());
        debug!("{config:?}");
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(Config::from(Args::default()), Config::default());
    }

    #[test]
    fn takes_given_paths() {
        let config = Config::from(Args {
            output: Some(PathBuf::from("out/app.png")),
            font: Some(PathBuf::from("fonts/6x13.bdf")),
            spec: Some(PathBuf::new()),
        });
        assert_eq!(config.output, PathBuf::from("out/app.png"));
        assert_eq!(config.font_path, Some(PathBuf::from("fonts/6x13.bdf")));
        assert_eq!(config.spec_path, None);
    }

    #[test]
    fn parses_positional_output_and_flags() {
        let args =
            Args::try_parse_from(["icongen", "cli.png", "--font", "a.bdf", "--spec", "s.json"])
                .unwrap();
        let config = Config::from(args);
        assert_eq!(config.output, PathBuf::from("cli.png"));
        assert_eq!(config.font_path, Some(PathBuf::from("a.bdf")));
        assert_eq!(config.spec_path, Some(PathBuf::from("s.json")));
    }

    #[test]
    fn flags_never_become_the_output_path() {
        let help = Args::try_parse_from(["icongen", "--help"]).unwrap_err();
        assert_eq!(help.kind(), ErrorKind::DisplayHelp);

        let unknown = Args::try_parse_from(["icongen", "--bogus"]).unwrap_err();
        assert_eq!(unknown.kind(), ErrorKind::UnknownArgument);
    }
}
