use commons::{compute_listing_fee, CustomContractError, ItemId, Token};
use concordium_std::*;

/// Whether a market item is still on sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub enum ItemStatus {
    /// Deed is in escrow, waiting for a buyer.
    Listed,
    /// Deed was bought by the account.
    Sold(AccountAddress),
}

/// A single listing. Every listing of a deed creates a new item, so the same token may appear
/// under several item ids over time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct MarketItem {
    pub item_id: ItemId,
    pub token: Token,
    pub seller: AccountAddress,
    pub price: Amount,
    pub status: ItemStatus,
}

impl MarketItem {
    pub fn is_sold(&self) -> bool {
        matches!(self.status, ItemStatus::Sold(_))
    }

    /// Buyer of the item, `None` while it is listed.
    pub fn owner(&self) -> Option<AccountAddress> {
        match self.status {
            ItemStatus::Listed => None,
            ItemStatus::Sold(buyer) => Some(buyer),
        }
    }
}

/// The contract state.
#[derive(Serial, DeserialWithState, StateClone)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// Account that receives listing fees.
    pub operator: AccountAddress,
    /// Identifier given to the next listing.
    pub next_item_id: ItemId,
    /// Every listing ever created, indexed by identifier. Entries are never removed.
    pub items: StateMap<ItemId, MarketItem, S>,
    /// Item currently on sale for each escrowed deed.
    pub open_listings: StateMap<Token, ItemId, S>,
}

impl<S: HasStateApi> State<S> {
    /// Creates a new state with no listings.
    pub fn new(state_builder: &mut StateBuilder<S>, operator: AccountAddress) -> Self {
        State {
            operator,
            next_item_id: 0,
            items: state_builder.new_map(),
            open_listings: state_builder.new_map(),
        }
    }

    /// Checks a listing request that need no collaborator, in order: the price is positive,
    /// `paid` is exactly the listing fee and the deed is not in escrow under another listing.
    /// Returns the listing fee.
    pub fn validate_listing(
        &self,
        token: &Token,
        price: Amount,
        paid: Amount,
    ) -> Result<Amount, CustomContractError> {
        ensure!(price > Amount::zero(), CustomContractError::InvalidPrice);

        let fee = compute_listing_fee(price)?;
        ensure_eq!(paid, fee, CustomContractError::FeeMismatch);

        // A listed deed is held by the marketplace, not by whoever tries to list it again
        ensure!(
            self.listed_item_for(token).is_none(),
            CustomContractError::NotController
        );

        Ok(fee)
    }

    /// Store a new listing and return its identifier.
    pub fn record_listing(
        &mut self,
        token: Token,
        seller: AccountAddress,
        price: Amount,
    ) -> Result<ItemId, CustomContractError> {
        let item_id = self.next_item_id;
        self.next_item_id = item_id
            .checked_add(1)
            .ok_or(CustomContractError::ArithmeticOverflow)?;

        self.open_listings.insert(token.clone(), item_id);
        self.items.insert(
            item_id,
            MarketItem {
                item_id,
                token,
                seller,
                price,
                status: ItemStatus::Listed,
            },
        );

        Ok(item_id)
    }

    /// Mark an item as bought by `buyer` for `paid`. Returns the updated item.
    ///
    /// Fails if the item does not exist, was sold before or `paid` is not exactly its price.
    /// The state is left untouched on failure.
    pub fn settle(
        &mut self,
        item_id: ItemId,
        buyer: AccountAddress,
        paid: Amount,
    ) -> Result<MarketItem, CustomContractError> {
        let mut item = self.item(item_id)?;

        ensure!(!item.is_sold(), CustomContractError::AlreadySold);
        ensure_eq!(paid, item.price, CustomContractError::AmountMismatch);

        item.status = ItemStatus::Sold(buyer);
        self.items.insert(item_id, item.clone());
        self.open_listings.remove(&item.token);

        Ok(item)
    }

    pub fn item(&self, item_id: ItemId) -> Result<MarketItem, CustomContractError> {
        self.items
            .get(&item_id)
            .map(|item| (*item).clone())
            .ok_or(CustomContractError::UnknownItem)
    }

    /// Items that are still on sale, in ascending identifier order.
    pub fn market_items(&self) -> Vec<MarketItem> {
        self.all_items().filter(|item| !item.is_sold()).collect()
    }

    /// Items bought or listed by `participant`, in ascending identifier order.
    pub fn items_of(&self, participant: &AccountAddress) -> Vec<MarketItem> {
        self.all_items()
            .filter(|item| item.seller == *participant || item.owner() == Some(*participant))
            .collect()
    }

    /// Items listed by `seller`, sold or not, in ascending identifier order.
    pub fn items_listed_by(&self, seller: &AccountAddress) -> Vec<MarketItem> {
        self.all_items()
            .filter(|item| item.seller == *seller)
            .collect()
    }

    /// The open listing of `token`, if any.
    pub fn listed_item_for(&self, token: &Token) -> Option<MarketItem> {
        let item_id = *self.open_listings.get(token)?;
        self.item(item_id).ok()
    }

    // Only for queries. `StateMap` iterates in key byte order, which is not numeric order for `u64`, so walk
    // the identifiers instead.
    fn all_items(&self) -> impl Iterator<Item = MarketItem> + '_ {
        (0..self.next_item_id).filter_map(move |item_id| self.item(item_id).ok())
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_cis2::TokenIdVec;
    use concordium_std::test_infrastructure::*;

    const REGISTRY: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };

    const OPERATOR: AccountAddress = AccountAddress([1; 32]);
    const USER_1: AccountAddress = AccountAddress([16; 32]);
    const USER_2: AccountAddress = AccountAddress([17; 32]);

    fn deed(id: u8) -> Token {
        Token {
            contract: REGISTRY,
            id: TokenIdVec(vec![id]),
        }
    }

    fn empty_state(state_builder: &mut TestStateBuilder) -> State<TestStateApi> {
        State::new(state_builder, OPERATOR)
    }

    #[concordium_test]
    fn test_record_listing() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = empty_state(&mut state_builder);

        let first = state.record_listing(deed(1), USER_1, Amount::from_ccd(500));
        let second = state.record_listing(deed(2), USER_1, Amount::from_ccd(10));

        claim_eq!(first, Ok(0));
        claim_eq!(second, Ok(1));
        claim_eq!(state.next_item_id, 2);
        claim_eq!(
            state.item(0),
            Ok(MarketItem {
                item_id: 0,
                token: deed(1),
                seller: USER_1,
                price: Amount::from_ccd(500),
                status: ItemStatus::Listed,
            })
        );
        claim_eq!(state.item(2), Err(CustomContractError::UnknownItem));
    }

    #[concordium_test]
    fn test_record_listing_overflow() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = empty_state(&mut state_builder);
        state.next_item_id = ItemId::MAX;

        let result = state.record_listing(deed(1), USER_1, Amount::from_ccd(1));

        claim_eq!(result, Err(CustomContractError::ArithmeticOverflow));
        claim_eq!(state.next_item_id, ItemId::MAX);
        claim_eq!(state.item(ItemId::MAX), Err(CustomContractError::UnknownItem));
        claim!(state.open_listings.get(&deed(1)).is_none());
    }

    #[concordium_test]
    fn test_validate_listing() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = empty_state(&mut state_builder);

        claim_eq!(
            state.validate_listing(&deed(1), Amount::zero(), Amount::zero()),
            Err(CustomContractError::InvalidPrice)
        );
        claim_eq!(
            state.validate_listing(&deed(1), Amount::from_ccd(500), Amount::from_ccd(25)),
            Ok(Amount::from_ccd(25))
        );
        claim_eq!(
            state.validate_listing(&deed(1), Amount::from_ccd(500), Amount::from_ccd(24)),
            Err(CustomContractError::FeeMismatch)
        );
        claim_eq!(
            state.validate_listing(&deed(1), Amount::from_ccd(500), Amount::from_ccd(26)),
            Err(CustomContractError::FeeMismatch)
        );
        // Fee of a tiny price rounds down to nothing
        claim_eq!(
            state.validate_listing(&deed(1), Amount::from_micro_ccd(19), Amount::zero()),
            Ok(Amount::zero())
        );

        let _ = state.record_listing(deed(1), USER_1, Amount::from_ccd(500));
        claim_eq!(
            state.validate_listing(&deed(1), Amount::from_ccd(500), Amount::from_ccd(25)),
            Err(CustomContractError::NotController)
        );
        // Fee is checked before escrow
        claim_eq!(
            state.validate_listing(&deed(1), Amount::from_ccd(500), Amount::zero()),
            Err(CustomContractError::FeeMismatch)
        );

        // Once sold, the deed may be listed again
        let _ = state.settle(0, USER_2, Amount::from_ccd(500));
        claim_eq!(
            state.validate_listing(&deed(1), Amount::from_ccd(600), Amount::from_ccd(30)),
            Ok(Amount::from_ccd(30))
        );
    }

    #[concordium_test]
    fn test_settle() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = empty_state(&mut state_builder);
        let _ = state.record_listing(deed(1), USER_1, Amount::from_ccd(500));

        let result = state.settle(0, USER_2, Amount::from_ccd(500));

        let item = result.expect_report("Settlement failed");
        claim!(item.is_sold());
        claim_eq!(item.owner(), Some(USER_2));
        claim_eq!(state.item(0), Ok(item));
    }

    #[concordium_test]
    fn test_settle_rejections() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = empty_state(&mut state_builder);
        let _ = state.record_listing(deed(1), USER_1, Amount::from_ccd(500));

        claim_eq!(
            state.settle(7, USER_2, Amount::from_ccd(500)),
            Err(CustomContractError::UnknownItem)
        );
        claim_eq!(
            state.settle(0, USER_2, Amount::from_ccd(499)),
            Err(CustomContractError::AmountMismatch)
        );
        claim_eq!(
            state.settle(0, USER_2, Amount::from_ccd(501)),
            Err(CustomContractError::AmountMismatch)
        );
        // Failed attempts leave the item on sale
        claim!(!state.item(0).expect_report("Item is missing").is_sold());

        claim!(state.settle(0, USER_2, Amount::from_ccd(500)).is_ok());
        claim_eq!(
            state.settle(0, USER_1, Amount::from_ccd(500)),
            Err(CustomContractError::AlreadySold)
        );
        claim_eq!(
            state.item(0).expect_report("Item is missing").owner(),
            Some(USER_2)
        );
    }

    #[concordium_test]
    fn test_open_listings() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = empty_state(&mut state_builder);

        let _ = state.record_listing(deed(1), USER_1, Amount::from_ccd(500));
        let _ = state.record_listing(deed(2), USER_1, Amount::from_ccd(10));
        claim_eq!(state.open_listings.get(&deed(1)).map(|id| *id), Some(0));
        claim_eq!(state.open_listings.get(&deed(2)).map(|id| *id), Some(1));

        // A rejected sale keeps the listing open
        let _ = state.settle(0, USER_2, Amount::from_ccd(1));
        claim_eq!(state.open_listings.get(&deed(1)).map(|id| *id), Some(0));

        let _ = state.settle(0, USER_2, Amount::from_ccd(500));
        claim!(state.open_listings.get(&deed(1)).is_none());
        claim_eq!(state.listed_item_for(&deed(1)), None);
        claim_eq!(
            state.listed_item_for(&deed(2)).map(|item| item.item_id),
            Some(1)
        );

        // Relisting points the deed at the new item
        let relisted = state.record_listing(deed(1), USER_2, Amount::from_ccd(600));
        claim_eq!(relisted, Ok(2));
        claim_eq!(state.open_listings.get(&deed(1)).map(|id| *id), Some(2));
        claim_eq!(
            state.listed_item_for(&deed(1)).map(|item| item.seller),
            Some(USER_2)
        );

        let _ = state.settle(2, USER_1, Amount::from_ccd(600));
        let _ = state.settle(1, USER_2, Amount::from_ccd(10));
        claim!(state.open_listings.iter().next().is_none());
        claim_eq!(state.market_items(), Vec::new());
    }

    #[concordium_test]
    fn test_queries() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = empty_state(&mut state_builder);

        // Enough items for the key byte order to differ from numeric order
        for id in 0..20u8 {
            let _ = state.record_listing(deed(id), USER_1, Amount::from_ccd(u64::from(id) + 1));
        }
        let _ = state.settle(3, USER_2, Amount::from_ccd(4));
        let _ = state.record_listing(deed(3), USER_2, Amount::from_ccd(8));

        let market: Vec<ItemId> = state.market_items().iter().map(|item| item.item_id).collect();
        let expected: Vec<ItemId> = (0..21).filter(|id| *id != 3).collect();
        claim_eq!(market, expected);

        let mine: Vec<ItemId> = state.items_of(&USER_2).iter().map(|item| item.item_id).collect();
        claim_eq!(mine, vec![3, 20]);

        let listed: Vec<ItemId> = state
            .items_listed_by(&USER_2)
            .iter()
            .map(|item| item.item_id)
            .collect();
        claim_eq!(listed, vec![20]);

        claim_eq!(state.items_of(&OPERATOR), Vec::new());
        claim_eq!(state.items_of(&USER_1).len(), 20);

        claim_eq!(
            state.listed_item_for(&deed(3)).map(|item| item.item_id),
            Some(20)
        );
        claim_eq!(state.listed_item_for(&deed(42)), None);
    }
}
