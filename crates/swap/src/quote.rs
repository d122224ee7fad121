//! Swap quotes and the input they were computed for.

use crate::{
    chain::ChainContext,
    error::SwapError,
    request::{Direction, SwapRequest},
};
use alloy_primitives::U256;
use metaswap_common::{DEFAULT_DECIMALS, contracts::IMetaSwap, parse_amount};
use serde::Serialize;

/// The exact input a quote is valid for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteKey {
    pub direction: Direction,
    pub amount: U256,
    pub chain_id: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    pub output: U256,
    pub valid_for: QuoteKey,
}

impl QuoteResult {
    /// Whether this quote may be used for `request` on `chain_id`.
    pub fn matches(&self, request: &SwapRequest, chain_id: u64) -> bool {
        parse_amount(&request.amount, DEFAULT_DECIMALS).is_ok_and(|amount| {
            self.valid_for == QuoteKey { direction: request.direction, amount, chain_id }
        })
    }
}

/// Asks the swap contract what a swap would return.
#[derive(Clone, Debug)]
pub struct QuoteEngine {
    ctx: ChainContext,
}

impl QuoteEngine {
    pub fn new(ctx: ChainContext) -> Self {
        Self { ctx }
    }

    pub fn chain_id(&self) -> u64 {
        self.ctx.chain_id()
    }

    pub async fn quote(
        &self,
        direction: Direction,
        amount: U256,
    ) -> Result<QuoteResult, SwapError> {
        let binding = self.ctx.binding()?;
        let output = match direction {
            Direction::NativeToToken => {
                self.ctx
                    .read(binding.swap, &IMetaSwap::getQuoteETHToTokenCall { ethAmount: amount })
                    .await
            }
            Direction::TokenToNative => {
                self.ctx
                    .read(binding.swap, &IMetaSwap::getQuoteTokenToETHCall { tokenAmount: amount })
                    .await
            }
        }
        .map_err(|err| SwapError::read("quote", &err))?;
        let valid_for = QuoteKey { direction, amount, chain_id: self.ctx.chain_id() };
        Ok(QuoteResult { output, valid_for })
    }

    /// Like [`Self::quote`], but takes user input and yields no quote instead of an error.
    pub async fn try_quote(&self, direction: Direction, amount: &str) -> Option<QuoteResult> {
        let amount = parse_amount(amount, DEFAULT_DECIMALS).ok()?;
        match self.quote(direction, amount).await {
            Ok(quote) => Some(quote),
            Err(err) => {
                debug!(%err, %direction, "no quote available");
                None
            }
        }
    }
}

/// The quote shown next to the swap form.
///
/// Any change of direction, amount or chain discards the current quote, and
/// [`QuoteBoard::displayed`] only returns a quote computed for the current input.
#[derive(Clone, Debug)]
pub struct QuoteBoard {
    chain_id: u64,
    direction: Direction,
    amount: String,
    quote: Option<QuoteResult>,
}

impl QuoteBoard {
    pub fn new(chain_id: u64, direction: Direction) -> Self {
        Self { chain_id, direction, amount: String::new(), quote: None }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Changes the direction. The amount referred to the other asset, so it is cleared too.
    pub fn set_direction(&mut self, direction: Direction) {
        if direction != self.direction {
            self.direction = direction;
            self.amount.clear();
            self.quote = None;
        }
    }

    pub fn toggle_direction(&mut self) {
        self.set_direction(self.direction.reversed());
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) {
        let amount = amount.into();
        if amount != self.amount {
            self.amount = amount;
            self.quote = None;
        }
    }

    pub fn set_chain(&mut self, chain_id: u64) {
        if chain_id != self.chain_id {
            self.chain_id = chain_id;
            self.quote = None;
        }
    }

    /// The current input, if the amount is a positive number.
    pub fn key(&self) -> Option<QuoteKey> {
        let amount = parse_amount(&self.amount, DEFAULT_DECIMALS).ok()?;
        Some(QuoteKey { direction: self.direction, amount, chain_id: self.chain_id })
    }

    /// Stores `quote` if it was computed for the current input.
    pub fn accept(&mut self, quote: QuoteResult) -> bool {
        let current = self.key() == Some(quote.valid_for);
        if current {
            self.quote = Some(quote);
        }
        current
    }

    /// Recomputes the quote for the current input.
    pub async fn refresh(&mut self, engine: &QuoteEngine) -> Option<QuoteResult> {
        self.quote = None;
        let key = self.key()?;
        if engine.chain_id() != key.chain_id {
            debug!(
                engine = engine.chain_id(),
                board = key.chain_id,
                "quote engine is on another chain"
            );
            return None;
        }
        let quote = match engine.quote(key.direction, key.amount).await {
            Ok(quote) => quote,
            Err(err) => {
                debug!(%err, "no quote available");
                return None;
            }
        };
        self.accept(quote).then_some(quote)
    }

    pub fn displayed(&self) -> Option<&QuoteResult> {
        self.quote.as_ref().filter(|quote| self.key() == Some(quote.valid_for))
    }

    /// The request the form currently describes.
    pub fn request(&self) -> SwapRequest {
        SwapRequest::new(self.direction, self.amount.clone())
    }

    /// Empties the form after a completed swap.
    pub fn clear(&mut self) {
        self.amount.clear();
        self.quote = None;
    }
}
