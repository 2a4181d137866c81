/*============================================================
  Synavera Project: Pro-Hook
  Module: prohook_core::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for the Pro-Hook apt JSON hook. Speaks the hook
    protocol with apt, classifies the pending transaction, and
    prints security and ESM advisories beneath apt's output.

  Security / Safety Notes:
    Runs with apt's privileges. Reads package databases and Pro
    client caches; the only write to the apt socket is the hello
    reply. Executes `dpkg --print-architecture` when needed.

  Dependencies:
    clap for CLI parsing.

  Operational Scope:
    Invoked by apt through `AptCli::Hooks::Install` and
    `AptCli::Hooks::Upgrade` with APT_HOOK_SOCKET set.

  Revision History:
    2025-11-12 COD  Authored Pro-Hook runtime.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

mod channel;
mod classifier;
mod config;
mod diff;
mod error;
mod host;
mod logger;
mod report;
mod session;
mod status;
mod transaction;
mod version;

use std::fs;
use std::io::{self, Read, Write};
use std::os::fd::RawFd;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};

use classifier::{collect_restricted_packages, count_security_updates, SecurityCounts};
use config::HookConfig;
use diff::{find_restricted_updates, RestrictedChannel};
use error::Result;
use logger::Logger;
use session::{Session, METHOD_PRE_PROMPT, METHOD_STATISTICS, PROTOCOL_VERSION};
use transaction::Transaction;

/// Command-line arguments for Pro-Hook.
#[derive(Debug, Parser)]
#[command(
    name = "pro-hook",
    version,
    author = "Synavera Systems",
    about = "apt JSON hook reporting security and ESM update availability"
)]
struct Cli {
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Use this descriptor instead of APT_HOOK_SOCKET.
    #[arg(long, value_name = "FD")]
    socket_fd: Option<RawFd>,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

/// What one hook invocation observed.
#[derive(Debug, Default)]
struct HookSummary {
    method: String,
    counts: Option<SecurityCounts>,
    residual_bytes: usize,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("pro-hook: {err}");
            err.exit_code()
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = HookConfig::load_from_optional_path(cli.config.as_deref())?;

    let log_path = cli.log.clone().or_else(|| config.logging.file.clone());
    let logger = Logger::new(log_path, cli.verbose || config.logging.verbose)?;
    logger.info("INIT", "Pro-Hook invoked by apt.");

    let outcome = channel::acquire(cli.socket_fd).and_then(|stream| {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        run_hook(stream, &config, &logger, &mut out)
    });

    let code = match outcome {
        Ok(summary) => {
            let detail = match summary.counts {
                Some(counts) => format!(" ({} security updates)", counts.total()),
                None => String::new(),
            };
            logger.info(
                "COMPLETE",
                format!("Session closed after `{}`{detail}", summary.method),
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = if err.is_protocol() { "PROTOCOL" } else { "FATAL" };
            logger.error(code, err.to_string());
            err.exit_code()
        }
    };
    logger.finalize()?;
    Ok(code)
}

/// Drive one hook session over `stream`, printing advisories to `out`.
fn run_hook<S: Read + Write, W: Write>(
    stream: S,
    config: &HookConfig,
    logger: &Logger,
    out: &mut W,
) -> Result<HookSummary> {
    let mut session = Session::new(stream);
    session.handshake()?;
    logger.debug("HELLO", format!("Answered hello with protocol {PROTOCOL_VERSION}"));

    let message = session.read_payload()?;
    let mut summary = HookSummary {
        method: message.method.clone(),
        ..HookSummary::default()
    };

    match message.method.as_str() {
        METHOD_STATISTICS => {
            let transaction = Transaction::from_message(&message)?;
            let counts = count_security_updates(&transaction, &config.channels);
            logger.debug(
                "COUNTS",
                format!(
                    "`{}`: standard={} esm-infra={} esm-apps={} of {} packages ({} unknown)",
                    transaction.command,
                    counts.standard,
                    counts.esm_infra,
                    counts.esm_apps,
                    transaction.packages.len(),
                    transaction.unknown_packages.len()
                ),
            );
            let text = report::count_message(&counts);
            if !text.is_empty() {
                writeln!(out, "{text}")?;
            }
            summary.counts = Some(counts);
        }
        METHOD_PRE_PROMPT => {
            let transaction = Transaction::from_message(&message)?;
            pre_prompt(&transaction, config, logger, out)?;
        }
        other => logger.debug("PAYLOAD", format!("Ignoring hook method `{other}`")),
    }

    session.terminate()?;
    logger.debug("BYE", format!("Session state `{}`", session.state()));
    summary.residual_bytes = session.buffered().len();
    if summary.residual_bytes > 0 {
        logger.warn(
            "RESIDUAL",
            format!("{} unread bytes after bye", summary.residual_bytes),
        );
    }
    Ok(summary)
}

/// Advisories shown before apt asks for confirmation.
fn pre_prompt<W: Write>(
    transaction: &Transaction,
    config: &HookConfig,
    logger: &Logger,
    out: &mut W,
) -> Result<()> {
    match esm_advisory(transaction, config) {
        Ok(Some(text)) => writeln!(out, "{text}")?,
        Ok(None) => logger.debug("ESM", "No updates held back in ESM channels"),
        Err(err) => logger.warn("ESM", format!("Skipping ESM advisory: {err}")),
    }

    match fs::read_to_string(&config.paths.apt_news) {
        Ok(news) => write!(out, "{news}")?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => logger.warn(
            "NEWS",
            format!("Failed to read {}: {err}", config.paths.apt_news.display()),
        ),
    }

    if config.paths.expired_notice.exists() {
        let names = collect_restricted_packages(transaction, &config.channels);
        logger.debug(
            "EXPIRED",
            format!("{} upgrades need a lapsed subscription", names.len()),
        );
        if !names.is_empty() {
            writeln!(out, "{}", report::expired_packages_notice(&names))?;
        }
    }
    Ok(())
}

/// ESM infra advisory when infra has held-back updates, else the apps one.
fn esm_advisory(transaction: &Transaction, config: &HookConfig) -> Result<Option<String>> {
    let release = host::read_os_release(&config.paths.os_release)?;
    let codename = config
        .host
        .codename
        .clone()
        .filter(|name| !name.is_empty())
        .or_else(|| Some(release.version_codename.clone()).filter(|name| !name.is_empty()))
        .or_else(|| transaction.distribution_codename().map(str::to_string));
    let Some(codename) = codename else {
        return Ok(None);
    };
    let arch = match &config.host.architecture {
        Some(arch) => arch.clone(),
        None => host::dpkg_architecture()?,
    };

    let updates = find_restricted_updates(
        &config.paths.dpkg_status,
        &config.paths.esm_lists_dir,
        &codename,
        &arch,
    )?;
    let (channel, names) = if !updates.infra.is_empty() {
        (RestrictedChannel::Infra, updates.infra)
    } else if !updates.apps.is_empty() {
        (RestrictedChannel::Apps, updates.apps)
    } else {
        return Ok(None);
    };

    let cloud = host::cloud_id(&config.paths.cloud_id);
    Ok(Some(report::esm_packages_notice(
        channel, &names, &codename, cloud,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HostConfig, PathsConfig};
    use crate::error::HookError;
    use crate::session::tests::{ScriptedStream, BYE, HELLO};

    const STATS: &str = concat!(
        r#"{"jsonrpc":"2.0","method":"org.debian.apt.hooks.install.statistics","params":{"command":"upgrade","packages":["#,
        r#"{"id":1,"name":"openssl","architecture":"amd64","mode":"upgrade","versions":{"#,
        r#""candidate":{"id":2,"version":"1.1","architecture":"amd64","pin":500,"origins":[{"archive":"jammy-security","codename":"jammy","version":"22.04","origin":"Ubuntu","label":"Ubuntu","site":""}]},"#,
        r#""install":{"id":2,"version":"1.1","architecture":"amd64","pin":500,"origins":[{"archive":"jammy-security","codename":"jammy","version":"22.04","origin":"Ubuntu","label":"Ubuntu","site":""}]},"#,
        r#""current":{"id":1,"version":"1.0","architecture":"amd64","pin":100,"origins":[]}}},"#,
        r#"{"id":3,"name":"nodejs","architecture":"amd64","mode":"upgrade","versions":{"#,
        r#""install":{"id":4,"version":"12.22.9~esm1","architecture":"amd64","pin":510,"origins":[{"archive":"jammy-apps-security","codename":"jammy","version":"22.04","origin":"UbuntuESMApps","label":"Ubuntu","site":"esm.ubuntu.com"}]}}}"#,
        "]}}\n\n"
    );

    fn quiet_logger() -> Logger {
        Logger::new(None, false).unwrap()
    }

    fn run_script(script: &str, config: &HookConfig) -> (Result<HookSummary>, String) {
        let mut out = Vec::new();
        let outcome = run_hook(ScriptedStream::new(script), config, &quiet_logger(), &mut out);
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn statistics_session_counts_and_reports() {
        let script = format!("{HELLO}{STATS}{BYE}");
        let (outcome, printed) = run_script(&script, &HookConfig::default());
        let summary = outcome.unwrap();
        assert_eq!(summary.method, METHOD_STATISTICS);
        assert_eq!(
            summary.counts,
            Some(SecurityCounts {
                standard: 1,
                esm_infra: 0,
                esm_apps: 1
            })
        );
        assert_eq!(summary.residual_bytes, 0);
        assert_eq!(
            printed,
            "1 standard LTS security update and 1 esm-apps security update\n"
        );
    }

    #[test]
    fn missing_bye_fails_after_printing_counts() {
        let script = format!("{HELLO}{STATS}{STATS}");
        let (outcome, _) = run_script(&script, &HookConfig::default());
        assert!(matches!(
            outcome,
            Err(HookError::ProtocolViolation { .. })
        ));
    }

    #[test]
    fn unknown_payload_method_is_ignored() {
        let payload =
            "{\"jsonrpc\":\"2.0\",\"method\":\"org.debian.apt.hooks.install.package-list\",\"params\":{}}\n\n";
        let script = format!("{HELLO}{payload}{BYE}");
        let (outcome, printed) = run_script(&script, &HookConfig::default());
        let summary = outcome.unwrap();
        assert!(summary.counts.is_none());
        assert!(printed.is_empty());
    }

    #[test]
    fn pre_prompt_prints_esm_news_and_expired_notices() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("status"),
            "Package: openssl\nStatus: install ok installed\nVersion: 1.0.2g-1ubuntu4.20\n",
        )
        .unwrap();
        fs::write(
            root.join(
                "esm.ubuntu.com_infra_ubuntu_dists_xenial-infra-updates_main_binary-amd64_Packages",
            ),
            "Package: openssl\nVersion: 1.0.2g-1ubuntu4.20+esm5\n",
        )
        .unwrap();
        fs::write(root.join("os-release"), "VERSION_CODENAME=xenial\n").unwrap();
        fs::write(root.join("apt-news"), "Ubuntu news line\n").unwrap();
        fs::write(root.join("expired"), "").unwrap();

        let config = HookConfig {
            paths: PathsConfig {
                dpkg_status: root.join("status"),
                esm_lists_dir: root.to_path_buf(),
                apt_news: root.join("apt-news"),
                expired_notice: root.join("expired"),
                os_release: root.join("os-release"),
                cloud_id: root.join("cloud-id"),
            },
            host: HostConfig {
                architecture: Some("amd64".into()),
                codename: None,
            },
            ..HookConfig::default()
        };

        let pre_prompt = STATS.replace(METHOD_STATISTICS, METHOD_PRE_PROMPT);
        let script = format!("{HELLO}{pre_prompt}{BYE}");
        let (outcome, printed) = run_script(&script, &config);
        assert_eq!(outcome.unwrap().method, METHOD_PRE_PROMPT);

        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(
            lines,
            vec![
                "The following security update requires Ubuntu Pro with 'esm-infra' enabled:",
                "  openssl",
                "Learn more about Ubuntu Pro for 16.04 at https://ubuntu.com/16-04",
                "Ubuntu news line",
                "The following packages will fail to download because your Ubuntu Pro subscription has expired",
                "  nodejs",
                "Renew your subscription or `sudo pro detach` to remove these errors",
            ]
        );
    }
}
