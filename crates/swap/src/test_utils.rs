//! In-memory chain, wallet and remote signer used by tests.

use crate::chain::ChainContext;
use alloy_primitives::{Address, Bytes, TxHash, TxKind, U256, keccak256};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{SolCall, SolValue};
use metaswap_common::{
    ChainClient, ReceiptOutcome,
    contracts::{IMetaSwap, ITestToken},
};
use metaswap_config::{AddChainParams, ChainRegistry, ContractBinding, SEPOLIA_CHAIN_ID};
use metaswap_wallets::{
    AuthContext, Authenticator, InjectedProvider, ProviderError, RemoteSignerError,
    RemoteSigningService,
};
use parking_lot::Mutex;
use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

pub const ALICE: Address = Address::repeat_byte(0xa1);
pub const BOB: Address = Address::repeat_byte(0xb0);
pub const TOKEN: Address = Address::repeat_byte(0x70);
pub const SWAP: Address = Address::repeat_byte(0x5a);

/// `n` whole units of an 18 decimals asset.
pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10).pow(U256::from(18))
}

/// Tokens minted per `faucet()` claim.
pub fn faucet_amount() -> U256 {
    ether(100)
}

/// The Sepolia context with the mock contracts deployed.
pub fn deployed_context(chain: MockChain) -> ChainContext {
    let binding =
        ContractBinding { chain_id: SEPOLIA_CHAIN_ID, token: TOKEN, swap: SWAP, swap_hub: None };
    ChainContext::new(sepolia(), Some(binding), Arc::new(chain))
}

/// The Sepolia context without any deployment.
pub fn undeployed_context(chain: MockChain) -> ChainContext {
    ChainContext::new(sepolia(), None, Arc::new(chain))
}

fn sepolia() -> metaswap_config::ChainProfile {
    ChainRegistry::default().resolve(SEPOLIA_CHAIN_ID).cloned().expect("sepolia is built in")
}

/// A transaction that reached the mock chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentTx {
    pub hash: TxHash,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
}

impl SentTx {
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.input.get(..4).and_then(|s| s.try_into().ok())
    }
}

#[derive(Debug, Default)]
struct ChainState {
    native: HashMap<Address, U256>,
    token: HashMap<Address, U256>,
    allowance: HashMap<Address, U256>,
    /// Tokens per native unit.
    rate: u64,
    fail_native: bool,
    fail_allowance: bool,
    fail_quotes: bool,
    revert: HashSet<[u8; 4]>,
    receipt_timeout: bool,
    receipt_delay: Duration,
    receipts: HashMap<TxHash, ReceiptOutcome>,
    sent: Vec<SentTx>,
    requests: usize,
    nonce: u64,
}

/// A chain holding the token and swap contracts at [`TOKEN`] and [`SWAP`].
///
/// Transactions apply their effects immediately; receipts are served from memory.
#[derive(Clone, Debug)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self { state: Arc::new(Mutex::new(ChainState { rate: 1000, ..Default::default() })) }
    }
}

impl MockChain {
    pub fn with_native(self, owner: Address, amount: U256) -> Self {
        self.state.lock().native.insert(owner, amount);
        self
    }

    pub fn with_token(self, owner: Address, amount: U256) -> Self {
        self.set_token(owner, amount);
        self
    }

    pub fn with_allowance(self, owner: Address, amount: U256) -> Self {
        self.state.lock().allowance.insert(owner, amount);
        self
    }

    pub fn set_token(&self, owner: Address, amount: U256) {
        self.state.lock().token.insert(owner, amount);
    }

    pub fn fail_native_balance(&self, fail: bool) {
        self.state.lock().fail_native = fail;
    }

    pub fn fail_allowance(&self, fail: bool) {
        self.state.lock().fail_allowance = fail;
    }

    pub fn fail_quotes(&self, fail: bool) {
        self.state.lock().fail_quotes = fail;
    }

    /// Transactions calling `selector` revert.
    pub fn revert_on(&self, selector: [u8; 4]) {
        self.state.lock().revert.insert(selector);
    }

    /// No receipt is ever returned.
    pub fn never_confirm(&self) {
        self.state.lock().receipt_timeout = true;
    }

    /// Receipts take `delay` to appear.
    pub fn confirm_after(&self, delay: Duration) {
        self.state.lock().receipt_delay = delay;
    }

    pub fn native_of(&self, owner: Address) -> U256 {
        self.state.lock().native.get(&owner).copied().unwrap_or_default()
    }

    pub fn token_of(&self, owner: Address) -> U256 {
        self.state.lock().token.get(&owner).copied().unwrap_or_default()
    }

    pub fn allowance_of(&self, owner: Address) -> U256 {
        self.state.lock().allowance.get(&owner).copied().unwrap_or_default()
    }

    /// Every transaction dispatched so far, in order.
    pub fn sent(&self) -> Vec<SentTx> {
        self.state.lock().sent.clone()
    }

    /// Number of requests served, reads included.
    pub fn requests(&self) -> usize {
        self.state.lock().requests
    }

    /// Applies `tx` as if it had been mined.
    pub fn execute(&self, tx: &TransactionRequest) -> TxHash {
        let mut state = self.state.lock();
        state.nonce += 1;
        let from = tx.from.unwrap_or_default();
        let to = match tx.to {
            Some(TxKind::Call(to)) => to,
            _ => Address::ZERO,
        };
        let value = tx.value.unwrap_or_default();
        let input = tx.input.input().cloned().unwrap_or_default();
        let hash = keccak256([from.as_slice(), state.nonce.to_be_bytes().as_slice()].concat());
        let sent = SentTx { hash, from, to, value, input };

        let reverted = sent.selector().is_some_and(|s| state.revert.contains(&s))
            || state.apply(&sent).is_err();
        let outcome = if reverted {
            ReceiptOutcome::Reverted { block_number: Some(state.nonce) }
        } else {
            ReceiptOutcome::Confirmed { block_number: Some(state.nonce), gas_used: 21_000 }
        };
        state.receipts.insert(hash, outcome);
        state.sent.push(sent);
        hash
    }
}

impl ChainState {
    fn apply(&mut self, tx: &SentTx) -> Result<(), &'static str> {
        let native = self.native.get(&tx.from).copied().unwrap_or_default();
        if native < tx.value {
            return Err("insufficient funds");
        }
        let selector = tx.selector();

        match tx.to {
            to if to == TOKEN && selector == Some(ITestToken::approveCall::SELECTOR) => {
                let call = ITestToken::approveCall::abi_decode(&tx.input).map_err(|_| "bad input")?;
                if call.spender == SWAP {
                    self.allowance.insert(tx.from, call.amount);
                }
            }
            to if to == TOKEN && selector == Some(ITestToken::transferCall::SELECTOR) => {
                let call =
                    ITestToken::transferCall::abi_decode(&tx.input).map_err(|_| "bad input")?;
                self.move_token(tx.from, call.to, call.amount)?;
            }
            to if to == TOKEN && selector == Some(ITestToken::faucetCall::SELECTOR) => {
                *self.token.entry(tx.from).or_default() += faucet_amount();
            }
            to if to == SWAP && selector == Some(IMetaSwap::swapETHToTokenCall::SELECTOR) => {
                *self.native.entry(tx.from).or_default() -= tx.value;
                *self.token.entry(tx.from).or_default() += tx.value * U256::from(self.rate);
            }
            to if to == SWAP && selector == Some(IMetaSwap::swapTokenToETHCall::SELECTOR) => {
                let call = IMetaSwap::swapTokenToETHCall::abi_decode(&tx.input)
                    .map_err(|_| "bad input")?;
                let allowance = self.allowance.get(&tx.from).copied().unwrap_or_default();
                if allowance < call.tokenAmount {
                    return Err("insufficient allowance");
                }
                self.move_token(tx.from, SWAP, call.tokenAmount)?;
                self.allowance.insert(tx.from, allowance - call.tokenAmount);
                *self.native.entry(tx.from).or_default() +=
                    call.tokenAmount / U256::from(self.rate);
            }
            to if to == TOKEN || to == SWAP => return Err("unknown function"),
            to => {
                *self.native.entry(tx.from).or_default() -= tx.value;
                *self.native.entry(to).or_default() += tx.value;
            }
        }
        Ok(())
    }

    fn move_token(&mut self, from: Address, to: Address, amount: U256) -> Result<(), &'static str> {
        let balance = self.token.get(&from).copied().unwrap_or_default();
        if balance < amount {
            return Err("insufficient token balance");
        }
        self.token.insert(from, balance - amount);
        *self.token.entry(to).or_default() += amount;
        Ok(())
    }

    fn read(&self, to: Address, data: &[u8]) -> eyre::Result<Bytes> {
        let selector: Option<[u8; 4]> = data.get(..4).and_then(|s| s.try_into().ok());
        let value = if to == TOKEN && selector == Some(ITestToken::balanceOfCall::SELECTOR) {
            let call = ITestToken::balanceOfCall::abi_decode(data)?;
            self.token.get(&call.owner).copied().unwrap_or_default()
        } else if to == TOKEN && selector == Some(ITestToken::allowanceCall::SELECTOR) {
            eyre::ensure!(!self.fail_allowance, "request timed out");
            let call = ITestToken::allowanceCall::abi_decode(data)?;
            eyre::ensure!(call.spender == SWAP, "unexpected spender {}", call.spender);
            self.allowance.get(&call.owner).copied().unwrap_or_default()
        } else if to == SWAP && selector == Some(IMetaSwap::getQuoteETHToTokenCall::SELECTOR) {
            eyre::ensure!(!self.fail_quotes, "execution reverted");
            let call = IMetaSwap::getQuoteETHToTokenCall::abi_decode(data)?;
            call.ethAmount * U256::from(self.rate)
        } else if to == SWAP && selector == Some(IMetaSwap::getQuoteTokenToETHCall::SELECTOR) {
            eyre::ensure!(!self.fail_quotes, "execution reverted");
            let call = IMetaSwap::getQuoteTokenToETHCall::abi_decode(data)?;
            call.tokenAmount / U256::from(self.rate)
        } else {
            eyre::bail!("execution reverted: no contract at {to}");
        };
        Ok(value.abi_encode().into())
    }
}

#[async_trait::async_trait]
impl ChainClient for MockChain {
    async fn balance(&self, owner: Address) -> eyre::Result<U256> {
        let mut state = self.state.lock();
        state.requests += 1;
        eyre::ensure!(!state.fail_native, "request timed out");
        Ok(state.native.get(&owner).copied().unwrap_or_default())
    }

    async fn call(&self, to: Address, data: Bytes) -> eyre::Result<Bytes> {
        let mut state = self.state.lock();
        state.requests += 1;
        state.read(to, &data)
    }

    async fn prepare(&self, mut tx: TransactionRequest) -> eyre::Result<TransactionRequest> {
        let mut state = self.state.lock();
        state.requests += 1;
        tx.chain_id = Some(SEPOLIA_CHAIN_ID);
        tx.nonce = Some(state.nonce);
        tx.gas = Some(100_000);
        tx.max_fee_per_gas = Some(2_000_000_000);
        tx.max_priority_fee_per_gas = Some(1_000_000_000);
        Ok(tx)
    }

    async fn send_raw(&self, raw: Bytes) -> eyre::Result<TxHash> {
        self.state.lock().requests += 1;
        // `MockRemoteSigner` "signs" by serializing the request
        let tx: TransactionRequest = serde_json::from_slice(&raw)?;
        Ok(self.execute(&tx))
    }

    async fn raw_request(
        &self,
        method: &'static str,
        _params: serde_json::Value,
    ) -> eyre::Result<serde_json::Value> {
        eyre::bail!("{method} is not supported by the mock chain")
    }

    async fn wait_for_receipt(
        &self,
        hash: TxHash,
        timeout: Duration,
    ) -> eyre::Result<ReceiptOutcome> {
        let (delay, never) = {
            let mut state = self.state.lock();
            state.requests += 1;
            (state.receipt_delay, state.receipt_timeout)
        };
        if never || delay > timeout {
            tokio::time::sleep(timeout).await;
            return Ok(ReceiptOutcome::TimedOut);
        }
        tokio::time::sleep(delay).await;
        Ok(self.state.lock().receipts.get(&hash).copied().unwrap_or(ReceiptOutcome::TimedOut))
    }
}

/// An injected wallet that executes on a [`MockChain`].
#[derive(Debug)]
pub struct MockInjected {
    accounts: Mutex<Vec<Address>>,
    chain_id: Mutex<u64>,
    known_chains: Mutex<BTreeSet<u64>>,
    added: Mutex<Vec<u64>>,
    reject: Mutex<Option<[u8; 4]>>,
    sent: Mutex<Vec<TransactionRequest>>,
    chain: Option<MockChain>,
}

impl MockInjected {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
            chain_id: Mutex::new(SEPOLIA_CHAIN_ID),
            known_chains: Mutex::new(BTreeSet::from([SEPOLIA_CHAIN_ID])),
            added: Mutex::default(),
            reject: Mutex::default(),
            sent: Mutex::default(),
            chain: None,
        }
    }

    pub fn on_chain(mut self, chain: MockChain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_known_chains(self, chains: impl IntoIterator<Item = u64>) -> Self {
        *self.known_chains.lock() = chains.into_iter().collect();
        self
    }

    pub fn connect(&self, account: Address) {
        self.accounts.lock().insert(0, account);
    }

    /// The user declines every request calling `selector`.
    pub fn reject_calls_to(&self, selector: [u8; 4]) {
        *self.reject.lock() = Some(selector);
    }

    pub fn chain(&self) -> u64 {
        *self.chain_id.lock()
    }

    pub fn added_chains(&self) -> Vec<u64> {
        self.added.lock().clone()
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().clone()
    }
}

#[async_trait::async_trait]
impl InjectedProvider for MockInjected {
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(self.accounts.lock().clone())
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(self.chain())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ProviderError> {
        let selector: Option<[u8; 4]> =
            tx.input.input().and_then(|input| input.get(..4)).and_then(|s| s.try_into().ok());
        if selector.is_some() && *self.reject.lock() == selector {
            return Err(ProviderError::from_code(4001, "User rejected the request."));
        }
        self.sent.lock().push(tx.clone());
        match &self.chain {
            Some(chain) => Ok(chain.execute(&tx)),
            None => Err(ProviderError::Other("wallet is not attached to a chain".to_string())),
        }
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        if !self.known_chains.lock().contains(&chain_id) {
            return Err(ProviderError::from_code(4902, format!("Unrecognized chain {chain_id:#x}")));
        }
        *self.chain_id.lock() = chain_id;
        Ok(())
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<(), ProviderError> {
        let chain_id = u64::from_str_radix(params.chain_id.trim_start_matches("0x"), 16)
            .map_err(|err| ProviderError::Other(err.to_string()))?;
        self.known_chains.lock().insert(chain_id);
        self.added.lock().push(chain_id);
        Ok(())
    }
}

/// A remote signer whose "signature" is the JSON encoded request, understood by
/// [`MockChain::send_raw`].
#[derive(Debug, Default)]
pub struct MockRemoteSigner {
    passkeys: usize,
    signed: Mutex<Vec<TransactionRequest>>,
    authenticator_queries: Mutex<usize>,
}

impl MockRemoteSigner {
    pub fn with_passkeys(passkeys: usize) -> Self {
        Self { passkeys, ..Default::default() }
    }

    pub fn signed(&self) -> Vec<TransactionRequest> {
        self.signed.lock().clone()
    }

    pub fn authenticator_queries(&self) -> usize {
        *self.authenticator_queries.lock()
    }
}

#[async_trait::async_trait]
impl RemoteSigningService for MockRemoteSigner {
    async fn authenticators(
        &self,
        _auth: &AuthContext,
    ) -> Result<Vec<Authenticator>, RemoteSignerError> {
        *self.authenticator_queries.lock() += 1;
        Ok((0..self.passkeys)
            .map(|i| Authenticator {
                authenticator_id: format!("passkey-{i}"),
                authenticator_name: format!("device {i}"),
            })
            .collect())
    }

    async fn sign_transaction(
        &self,
        _auth: &AuthContext,
        address: Address,
        tx: &TransactionRequest,
    ) -> Result<Bytes, RemoteSignerError> {
        if tx.from != Some(address) {
            return Err(RemoteSignerError::UnsignableTransaction("sender mismatch".to_string()));
        }
        self.signed.lock().push(tx.clone());
        serde_json::to_vec(tx)
            .map(Bytes::from)
            .map_err(|err| RemoteSignerError::InvalidResponse(err.to_string()))
    }
}
