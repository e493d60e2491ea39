/// Solana token mint addresses
pub mod mints {
    /// Wrapped SOL (native SOL wrapped as SPL token)
    pub const SOL: &str = "So11111111111111111111111111111111111111112";
    /// USDC (Circle USD Coin)
    pub const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
}

/// Program IDs
pub mod programs {
    /// Jupiter Aggregator v6 Program ID
    pub const JUPITER: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";
}

/// Jupiter v6 quote/swap API base URL
pub const JUPITER_API_URL: &str = "https://quote-api.jup.ag/v6";

/// Public mainnet RPC used when `RPC_ENDPOINT` is not set
pub const DEFAULT_RPC_ENDPOINT: &str = "https://api.mainnet-beta.solana.com";

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Upper bound for any basis-point value (100%)
pub const MAX_BASIS_POINTS: u16 = 10_000;

/// Decoded length of a Solana keypair (32 secret + 32 public)
pub const KEYPAIR_LENGTH: usize = 64;
