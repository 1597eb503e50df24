use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "add")]
#[command(about = "Check the size budget, then install packages")]
pub struct Config {
    /// Packages to install, e.g. react@18.2.0
    #[arg(required = true, num_args = 1..)]
    pub packages: Vec<String>,

    /// Log budget violations instead of aborting
    #[arg(short, long)]
    pub warning: bool,

    /// Project directory (defaults to the current directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Check the budget and print the install command without running it
    #[arg(long)]
    pub dry_run: bool,
}

impl Config {
    /// Absolute directory the installer runs in
    pub fn cwd(&self) -> Result<PathBuf> {
        depsize_core::resolve_working_dir(self.dir.as_deref())
    }

    /// Package specifiers with surrounding whitespace removed
    pub fn specifiers(&self) -> Vec<String> {
        self.packages.iter().map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packages_are_required() {
        assert!(Config::try_parse_from(["add"]).is_err());
    }

    #[test]
    fn test_parse_flags() {
        let cfg = Config::try_parse_from(["add", "react@18.2.0", "-w", "--dry-run", "-d", "app"])
            .unwrap();
        assert_eq!(cfg.packages, ["react@18.2.0"]);
        assert!(cfg.warning);
        assert!(cfg.dry_run);
        assert_eq!(cfg.dir, Some(PathBuf::from("app")));
    }

    #[test]
    fn test_specifiers_are_trimmed() {
        let cfg = Config {
            packages: vec![" react ".to_string(), "dayjs@1.11.7\n".to_string(), "  ".to_string()],
            ..Default::default()
        };
        assert_eq!(cfg.specifiers(), ["react", "dayjs@1.11.7"]);
    }
}
