use gtfs::data_model::transfers::TransferType;
use serde::{Deserialize, Serialize};

/// The two kinds of continuation this pipeline ever assigns. Maps onto the
/// feed's `transfer_type` enumeration via the in-seat / in-seat-not-allowed
/// pair (types 4 and 5), which is what a shared vehicle without onboard
/// continuity is expressed as in GTFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContinuationType {
    InSeat,
    VehicleContinuation,
}

impl From<ContinuationType> for TransferType {
    fn from(kind: ContinuationType) -> Self {
        match kind {
            ContinuationType::InSeat => TransferType::InSeatTransfer,
            ContinuationType::VehicleContinuation => TransferType::InSeatTrnasferNotAllowed,
        }
    }
}

impl TryFrom<TransferType> for ContinuationType {
    type Error = ();

    fn try_from(value: TransferType) -> Result<Self, Self::Error> {
        match value {
            TransferType::InSeatTransfer => Ok(ContinuationType::InSeat),
            TransferType::InSeatTrnasferNotAllowed => Ok(ContinuationType::VehicleContinuation),
            _ => Err(()),
        }
    }
}
