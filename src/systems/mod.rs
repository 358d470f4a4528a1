mod animals;
mod bookkeeping;
mod buildings;
mod economy;
mod units;

pub use animals::AnimalSystem;
pub use bookkeeping::BookkeepingSystem;
pub use buildings::BuildingSystem;
pub use economy::EconomySystem;
pub use units::UnitSystem;
