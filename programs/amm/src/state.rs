use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;

use crate::errors::{AmmError, Result};
use crate::math::{checked_add, checked_sub, integer_sqrt, mul_div_floor, product};

/// Minimum liquidity locked forever to prevent manipulation
pub const MINIMUM_LIQUIDITY: u64 = 1000;

/// Fee tiers are expressed in basis points over this denominator
pub const FEE_DENOMINATOR: u64 = 10_000;

/// Fee tiers accepted by default (0.01%, 0.05%, 0.3%, 1%)
pub const SUPPORTED_FEE_TIERS: [u16; 4] = [1, 5, 30, 100];

/// Flat pool creation fee in lamports of the native asset (0.01 SOL)
pub const DEFAULT_CREATION_FEE: u64 = 10_000_000;

/// Scale for spot prices (1e9, lamport precision)
pub const PRICE_SCALE: u64 = 1_000_000_000;

/// Holder of the permanently locked genesis shares. No caller may act as it.
pub const LOCKED_LIQUIDITY_HOLDER: Pubkey = Pubkey::new_from_array([0u8; 32]);

/// Pool identifier, allocated sequentially and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolId(pub u64);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

/// Canonical identifier of a trading pair plus fee tier.
///
/// `token0 < token1` always holds, so `(A, B, fee)` and `(B, A, fee)` build
/// the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PoolKeyRepr")]
pub struct PoolKey {
    token0: Pubkey,
    token1: Pubkey,
    fee_bps: u16,
}

#[derive(Deserialize)]
struct PoolKeyRepr {
    token0: Pubkey,
    token1: Pubkey,
    fee_bps: u16,
}

impl TryFrom<PoolKeyRepr> for PoolKey {
    type Error = AmmError;

    fn try_from(repr: PoolKeyRepr) -> Result<Self> {
        Self::new(repr.token0, repr.token1, repr.fee_bps)
    }
}

impl PoolKey {
    pub fn new(token_a: Pubkey, token_b: Pubkey, fee_bps: u16) -> Result<Self> {
        if token_a == token_b {
            return Err(AmmError::IdenticalTokens);
        }
        if fee_bps == 0 || fee_bps as u64 >= FEE_DENOMINATOR {
            return Err(AmmError::InvalidFee(fee_bps));
        }

        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };

        Ok(Self {
            token0,
            token1,
            fee_bps,
        })
    }

    pub fn token0(&self) -> Pubkey {
        self.token0
    }

    pub fn token1(&self) -> Pubkey {
        self.token1
    }

    pub fn fee_bps(&self) -> u16 {
        self.fee_bps
    }

    pub fn contains(&self, token: &Pubkey) -> bool {
        self.token0 == *token || self.token1 == *token
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}bps", self.token0, self.token1, self.fee_bps)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapDirection {
    /// token0 in, token1 out
    ZeroForOne,
    /// token1 in, token0 out
    OneForZero,
}

impl SwapDirection {
    /// Direction for a swap paying `token_in` into the pool.
    pub fn from_input(key: &PoolKey, token_in: &Pubkey) -> Result<Self> {
        if *token_in == key.token0 {
            Ok(Self::ZeroForOne)
        } else if *token_in == key.token1 {
            Ok(Self::OneForZero)
        } else {
            Err(AmmError::InvalidToken(*token_in))
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Self::ZeroForOne => Self::OneForZero,
            Self::OneForZero => Self::ZeroForOne,
        }
    }

    /// (input token, output token) for this direction
    pub fn tokens(self, key: &PoolKey) -> (Pubkey, Pubkey) {
        match self {
            Self::ZeroForOne => (key.token0, key.token1),
            Self::OneForZero => (key.token1, key.token0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PoolStatus {
    Uninitialized,
    Active,
}

/// Result of pricing a swap against a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapQuote {
    pub amount_in: u64,
    pub amount_in_after_fee: u64,
    pub amount_out: u64,
    /// Fee retained by the pool, in input tokens
    pub fee: u64,
    /// Price impact in basis points
    pub price_impact_bps: u64,
}

/// Amounts accepted for a deposit and the shares they mint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deposit {
    pub amount0: u64,
    pub amount1: u64,
    /// Shares added to the total supply
    pub liquidity_minted: u64,
    /// Shares credited to the depositor (differs from `liquidity_minted` at genesis)
    pub liquidity_to_caller: u64,
}

/// AMM pool record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pool {
    pub id: PoolId,

    pub key: PoolKey,

    /// Current reserve of token0
    pub reserve0: u64,

    /// Current reserve of token1
    pub reserve1: u64,

    /// Total shares issued, including the locked minimum
    pub total_liquidity_supply: u64,

    /// Cumulative swap fees retained for token0
    pub cumulative_fee0: u64,

    /// Cumulative swap fees retained for token1
    pub cumulative_fee1: u64,

    /// Sequence number of the operation that created the pool
    pub created_at: u64,

    pub creator: Pubkey,
}

impl Pool {
    pub fn new(id: PoolId, key: PoolKey, creator: Pubkey, created_at: u64) -> Self {
        Self {
            id,
            key,
            reserve0: 0,
            reserve1: 0,
            total_liquidity_supply: 0,
            cumulative_fee0: 0,
            cumulative_fee1: 0,
            created_at,
            creator,
        }
    }

    pub fn status(&self) -> PoolStatus {
        if self.total_liquidity_supply > 0 {
            PoolStatus::Active
        } else {
            PoolStatus::Uninitialized
        }
    }

    pub fn is_active(&self) -> bool {
        self.status() == PoolStatus::Active
    }

    /// Calculate the constant product K
    pub fn k(&self) -> u128 {
        product(self.reserve0, self.reserve1)
    }

    /// (reserve in, reserve out) for a swap direction
    pub fn reserves_for(&self, direction: SwapDirection) -> (u64, u64) {
        match direction {
            SwapDirection::ZeroForOne => (self.reserve0, self.reserve1),
            SwapDirection::OneForZero => (self.reserve1, self.reserve0),
        }
    }

    /// Calculate output amount for a swap using constant product formula
    /// x * y = k
    /// (x + dx) * (y - dy) = k
    /// dy = y * dx / (x + dx)
    /// where dx is the input after the fee is withheld.
    pub fn calculate_swap_output(&self, amount_in: u64, direction: SwapDirection) -> Result<SwapQuote> {
        if !self.is_active() {
            return Err(AmmError::PoolNotInitialized);
        }
        if amount_in == 0 {
            return Err(AmmError::InvalidAmount);
        }

        let (reserve_in, reserve_out) = self.reserves_for(direction);

        let fee_multiplier = FEE_DENOMINATOR - self.key.fee_bps as u64;
        let amount_in_after_fee = mul_div_floor(amount_in, fee_multiplier, FEE_DENOMINATOR)?;
        let fee = checked_sub(amount_in, amount_in_after_fee)?;

        let denominator = checked_add(reserve_in, amount_in_after_fee)?;
        let amount_out = mul_div_floor(amount_in_after_fee, reserve_out, denominator)?;

        if amount_out == 0 {
            return Err(AmmError::InsufficientOutput);
        }

        // Ideal output at the spot price, before curve slippage. The curve never
        // pays more than spot, so impact = D - ceil(out * D / ideal).
        let ideal_output = product(amount_in_after_fee, reserve_out) / reserve_in as u128;
        let price_impact_bps = if ideal_output > 0 {
            let scaled = product(amount_out, FEE_DENOMINATOR);
            let kept = scaled / ideal_output + u128::from(scaled % ideal_output != 0);
            (FEE_DENOMINATOR as u128).saturating_sub(kept) as u64
        } else {
            0
        };

        Ok(SwapQuote {
            amount_in,
            amount_in_after_fee,
            amount_out,
            fee,
            price_impact_bps,
        })
    }

    /// Calculate LP tokens minted by the first deposit: floor(sqrt(a0 * a1)).
    /// The caller receives this minus MINIMUM_LIQUIDITY.
    pub fn calculate_initial_liquidity(amount0: u64, amount1: u64) -> Result<u64> {
        let sqrt = integer_sqrt(product(amount0, amount1));

        if sqrt <= MINIMUM_LIQUIDITY as u128 {
            return Err(AmmError::MinimumLiquidityNotMet);
        }

        // sqrt of a product of two u64 fits in u64
        Ok(sqrt as u64)
    }

    /// Work out the accepted amounts and minted shares for a deposit.
    pub fn calculate_deposit(
        &self,
        amount0_desired: u64,
        amount1_desired: u64,
        amount0_min: u64,
        amount1_min: u64,
    ) -> Result<Deposit> {
        if amount0_desired == 0 || amount1_desired == 0 {
            return Err(AmmError::InvalidAmount);
        }

        if !self.is_active() {
            if amount0_desired < amount0_min || amount1_desired < amount1_min {
                return Err(AmmError::SlippageExceeded);
            }
            let minted = Self::calculate_initial_liquidity(amount0_desired, amount1_desired)?;
            return Ok(Deposit {
                amount0: amount0_desired,
                amount1: amount1_desired,
                liquidity_minted: minted,
                liquidity_to_caller: minted - MINIMUM_LIQUIDITY,
            });
        }

        let (amount0, amount1) = self.optimal_amounts(amount0_desired, amount1_desired)?;
        if amount0 < amount0_min || amount1 < amount1_min {
            return Err(AmmError::SlippageExceeded);
        }

        let minted = self.calculate_liquidity_for_amounts(amount0, amount1)?;
        if minted == 0 {
            return Err(AmmError::InsufficientLiquidityMinted);
        }

        Ok(Deposit {
            amount0,
            amount1,
            liquidity_minted: minted,
            liquidity_to_caller: minted,
        })
    }

    /// Largest pair within the desired amounts that keeps the reserve ratio.
    fn optimal_amounts(&self, amount0_desired: u64, amount1_desired: u64) -> Result<(u64, u64)> {
        let amount1_optimal = mul_div_floor(amount0_desired, self.reserve1, self.reserve0)?;
        if amount1_optimal <= amount1_desired {
            return Ok((amount0_desired, amount1_optimal));
        }

        let amount0_optimal = mul_div_floor(amount1_desired, self.reserve0, self.reserve1)?;
        if amount0_optimal > amount0_desired {
            return Err(AmmError::SlippageExceeded);
        }
        Ok((amount0_optimal, amount1_desired))
    }

    /// LP tokens = min(amount0 * total / reserve0, amount1 * total / reserve1)
    pub fn calculate_liquidity_for_amounts(&self, amount0: u64, amount1: u64) -> Result<u64> {
        let from0 = mul_div_floor(amount0, self.total_liquidity_supply, self.reserve0)?;
        let from1 = mul_div_floor(amount1, self.total_liquidity_supply, self.reserve1)?;
        Ok(from0.min(from1))
    }

    /// Calculate tokens to return when burning `liquidity` shares
    pub fn calculate_tokens_for_liquidity(&self, liquidity: u64) -> Result<(u64, u64)> {
        if !self.is_active() {
            return Err(AmmError::PoolNotInitialized);
        }
        if liquidity > self.total_liquidity_supply {
            return Err(AmmError::InsufficientLiquidity);
        }

        let amount0 = mul_div_floor(liquidity, self.reserve0, self.total_liquidity_supply)?;
        let amount1 = mul_div_floor(liquidity, self.reserve1, self.total_liquidity_supply)?;

        Ok((amount0, amount1))
    }

    /// Spot price of token0 in token1, scaled by PRICE_SCALE
    pub fn price_0_in_1(&self) -> u64 {
        if self.reserve0 == 0 {
            return 0;
        }
        mul_div_floor(self.reserve1, PRICE_SCALE, self.reserve0).unwrap_or(u64::MAX)
    }

    /// Spot price of token1 in token0, scaled by PRICE_SCALE
    pub fn price_1_in_0(&self) -> u64 {
        if self.reserve1 == 0 {
            return 0;
        }
        mul_div_floor(self.reserve0, PRICE_SCALE, self.reserve1).unwrap_or(u64::MAX)
    }
}

/// Protocol treasury, funded by pool creation fees
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Treasury {
    /// Immutable after construction
    owner: Pubkey,

    pub balance: u64,

    pub total_collected: u64,

    pub total_withdrawn: u64,
}

impl Treasury {
    pub fn new(owner: Pubkey) -> Self {
        Self {
            owner,
            balance: 0,
            total_collected: 0,
            total_withdrawn: 0,
        }
    }

    pub fn owner(&self) -> Pubkey {
        self.owner
    }
}
