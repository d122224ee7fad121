//! Interfaces of the deployed token and swap contracts.

use alloy_sol_types::sol;

sol! {
    /// Fungible test token with a public faucet.
    interface ITestToken {
        #[derive(Debug)]
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
        /// Mints a fixed amount of tokens to the caller.
        function faucet() external;
    }
}

sol! {
    /// Fixed rate swap between the native asset and the test token.
    interface IMetaSwap {
        function getQuoteETHToToken(uint256 ethAmount) external view returns (uint256);
        function getQuoteTokenToETH(uint256 tokenAmount) external view returns (uint256);
        function swapETHToToken() external payable;
        function swapTokenToETH(uint256 tokenAmount) external;
    }
}

/// Symbol of the test token.
pub const TOKEN_SYMBOL: &str = "mUSD";
