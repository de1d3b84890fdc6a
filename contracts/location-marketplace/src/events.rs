use commons::{ItemId, Token, BUY_TAG, LISTING_TAG};
use concordium_std::*;

/// Deed listing event data.
#[derive(Debug, Serial)]
pub struct ListEvent<'a> {
    /// Identifier of the new market item.
    pub item_id: ItemId,
    /// Listed deed.
    pub token: &'a Token,
    /// Account that listed the deed.
    pub seller: &'a AccountAddress,
    /// Asking price.
    pub price: Amount,
    /// Listing fee paid to the operator.
    pub fee: Amount,
}

/// Deed sale event data.
#[derive(Debug, Serial)]
pub struct SaleEvent<'a> {
    pub item_id: ItemId,
    pub token: &'a Token,
    pub seller: &'a AccountAddress,
    pub buyer: &'a AccountAddress,
    pub price: Amount,
}

/// Tagged marketplace event to be serialized for the event log.
#[derive(Debug)]
pub enum MarketEvent<'a> {
    /// Deed put on sale
    List(ListEvent<'a>),
    /// Deed bought
    Sale(SaleEvent<'a>),
}

impl<'a> MarketEvent<'a> {
    pub fn list(
        item_id: ItemId,
        token: &'a Token,
        seller: &'a AccountAddress,
        price: Amount,
        fee: Amount,
    ) -> Self {
        Self::List(ListEvent {
            item_id,
            token,
            seller,
            price,
            fee,
        })
    }

    pub fn sale(
        item_id: ItemId,
        token: &'a Token,
        seller: &'a AccountAddress,
        buyer: &'a AccountAddress,
        price: Amount,
    ) -> Self {
        Self::Sale(SaleEvent {
            item_id,
            token,
            seller,
            buyer,
            price,
        })
    }
}

impl<'a> Serial for MarketEvent<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            MarketEvent::List(event) => {
                out.write_u8(LISTING_TAG)?;
                event.serial(out)
            }
            MarketEvent::Sale(event) => {
                out.write_u8(BUY_TAG)?;
                event.serial(out)
            }
        }
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_cis2::TokenIdVec;

    #[concordium_test]
    fn test_event_tags() {
        let token = Token {
            contract: ContractAddress {
                index: 1,
                subindex: 0,
            },
            id: TokenIdVec(vec![1, 2]),
        };
        let seller = AccountAddress([16; 32]);
        let buyer = AccountAddress([17; 32]);

        let list = to_bytes(&MarketEvent::list(
            3,
            &token,
            &seller,
            Amount::from_ccd(500),
            Amount::from_ccd(25),
        ));
        claim_eq!(list[0], LISTING_TAG);
        claim_eq!(list[1..9], 3u64.to_le_bytes());

        let sale = to_bytes(&MarketEvent::sale(
            3,
            &token,
            &seller,
            &buyer,
            Amount::from_ccd(500),
        ));
        claim_eq!(sale[0], BUY_TAG);
        let payload = to_bytes(&SaleEvent {
            item_id: 3,
            token: &token,
            seller: &seller,
            buyer: &buyer,
            price: Amount::from_ccd(500),
        });
        claim_eq!(sale[1..], payload[..]);
    }
}
