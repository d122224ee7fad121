use eyre::EyreHandler;
use itertools::Itertools;
use metaswap::{ErrorKind, SwapError};
use metaswap_common::errors::dedup_chain;
use metaswap_wallets::WalletSignerError;
use std::{error::Error, fmt};

/// Reports errors of the `metaswap` binary on one line, followed by a hint on how to recover
/// where one is known.
#[derive(Default)]
pub struct Handler {
    /// Takes over the `{:?}` rendering when `METASWAP_DEBUG` is set.
    verbose: Option<Box<dyn EyreHandler>>,
}

impl Handler {
    pub fn new(verbose: Option<Box<dyn EyreHandler>>) -> Self {
        Self { verbose }
    }
}

impl EyreHandler for Handler {
    fn display(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", dedup_chain(error).into_iter().format("; "))
    }

    fn debug(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(verbose) = &self.verbose {
            return verbose.debug(error, f);
        }
        if f.alternate() {
            return fmt::Debug::fmt(error, f);
        }

        let chain = dedup_chain(error);
        match chain.as_slice() {
            [] => write!(f, "{error}")?,
            [error] => write!(f, "{error}")?,
            [error, causes @ ..] => {
                write!(f, "{error}\n\nCaused by:")?;
                for cause in causes {
                    write!(f, "\n    {cause}")?;
                }
            }
        }
        if let Some(hint) = kind_of(error).and_then(hint) {
            write!(f, "\n\nHint: {hint}")?;
        }
        Ok(())
    }
}

/// The [`ErrorKind`] of the first swap or signer error in the chain of `error`.
fn kind_of(error: &(dyn Error + 'static)) -> Option<ErrorKind> {
    let mut next = Some(error);
    while let Some(error) = next {
        if let Some(err) = error.downcast_ref::<SwapError>() {
            return Some(err.kind());
        }
        if let Some(err) = error.downcast_ref::<WalletSignerError>() {
            return Some(err.into());
        }
        next = error.source();
    }
    None
}

fn hint(kind: ErrorKind) -> Option<&'static str> {
    Some(match kind {
        ErrorKind::SignerUnavailable => {
            "pass `--browser` or `--unlocked --from <ADDRESS>`, or `metaswap login` with a \
             `--remote-stamp`"
        }
        ErrorKind::MissingAuthContext => {
            "run `metaswap login --user-id <ID> --organization-id <ID> --address <ADDRESS>`"
        }
        ErrorKind::NoPasskeyRegistered => "register a passkey with the remote signer first",
        ErrorKind::UnsupportedNetwork => {
            "`metaswap chains` lists the chains with deployed contracts"
        }
        ErrorKind::InsufficientBalance => "`metaswap faucet` claims test tokens",
        ErrorKind::Timeout => {
            "the transaction may still confirm, check it on the explorer before retrying"
        }
        _ => return None,
    })
}

/// Installs the [`eyre`] and [`panic`](mod@std::panic) hooks as the global ones.
///
/// By default a short user-centric handler is installed. With `METASWAP_DEBUG` set in the
/// environment the `color-eyre` handler renders reports instead. Panics always go through the
/// latter.
pub fn install() {
    let panic_section = "This is a bug. Please report it together with the command you ran.";
    let (panic_hook, eyre_hook) =
        color_eyre::config::HookBuilder::default().panic_section(panic_section).into_hooks();
    panic_hook.install();
    let eyre_hook = eyre_hook.into_eyre_hook();
    let verbose = std::env::var_os("METASWAP_DEBUG").is_some();
    if let Err(err) =
        eyre::set_hook(Box::new(move |e| Box::new(Handler::new(verbose.then(|| eyre_hook(e))))))
    {
        debug!("failed to install eyre error hook: {err}");
    }
}
