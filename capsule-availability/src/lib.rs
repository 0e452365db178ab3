pub mod recommend;
pub mod resolver;

pub use recommend::{
    RecommendPolicy, RecommendationResolver, RecommendedRoom, MAX_RECOMMENDATIONS,
    MAX_UNAVAILABLE_FRACTION,
};
pub use resolver::AvailabilityResolver;
