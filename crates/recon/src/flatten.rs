use crate::error::ReconError;
use crate::feed::{EntitySelector, FeedEntity, StopTimeUpdate, TripDescriptor, VehiclePosition};
use crate::model::{Category, ComparisonUnit, CompositeKey};

/// What an entity contributes to one category.
pub enum Flattened<'a> {
    /// The entity carries no payload for the category.
    Absent,
    /// Lazily produced units; may be empty when the nested list is.
    Units(Units<'a>),
}

/// Lazy unit sequence for one entity.
pub struct Units<'a> {
    entity_id: Option<&'a str>,
    inner: UnitsInner<'a>,
}

enum UnitsInner<'a> {
    Alert(std::slice::Iter<'a, EntitySelector>),
    TripUpdate {
        trip: Option<&'a TripDescriptor>,
        updates: std::slice::Iter<'a, StopTimeUpdate>,
    },
    Vehicle(Option<&'a VehiclePosition>),
}

/// Decompose `entity` into the comparison units of `category`.
pub fn flatten(category: Category, entity: &FeedEntity) -> Flattened<'_> {
    let inner = match category {
        Category::Alert => match &entity.alert {
            Some(alert) => UnitsInner::Alert(alert.informed_entity.iter()),
            None => return Flattened::Absent,
        },
        Category::TripUpdate => match &entity.trip_update {
            Some(tu) => UnitsInner::TripUpdate {
                trip: tu.trip.as_ref(),
                updates: tu.stop_time_update.iter(),
            },
            None => return Flattened::Absent,
        },
        Category::VehiclePosition => match &entity.vehicle {
            Some(vp) => UnitsInner::Vehicle(Some(vp)),
            None => return Flattened::Absent,
        },
    };
    Flattened::Units(Units {
        entity_id: entity.id.as_deref(),
        inner,
    })
}

impl Units<'_> {
    fn missing(&self, category: Category, field: &'static str) -> ReconError {
        ReconError::MissingKeyField {
            category,
            entity_id: self.entity_id.unwrap_or_default().to_string(),
            field,
        }
    }

    /// First key value of every unit. Checked before the nested fields so an
    /// entity decoded without an id is reported as such.
    fn entity_id(&self, category: Category) -> Result<String, ReconError> {
        self.entity_id
            .map(str::to_string)
            .ok_or_else(|| self.missing(category, "entity.id"))
    }

    fn unit(category: Category, entity_id: String, rest: Vec<String>) -> ComparisonUnit {
        let mut values = Vec::with_capacity(rest.len() + 1);
        values.push(entity_id);
        values.extend(rest);
        ComparisonUnit {
            category,
            key: CompositeKey::new(values),
        }
    }

    fn alert_unit(&self, selector: &EntitySelector) -> Result<ComparisonUnit, ReconError> {
        let cat = Category::Alert;
        let entity_id = self.entity_id(cat)?;
        let route_id = selector
            .route_id
            .clone()
            .ok_or_else(|| self.missing(cat, "informed_entity.route_id"))?;
        Ok(Self::unit(cat, entity_id, vec![route_id]))
    }

    fn trip_update_unit(
        &self,
        trip: Option<&TripDescriptor>,
        update: &StopTimeUpdate,
    ) -> Result<ComparisonUnit, ReconError> {
        let cat = Category::TripUpdate;
        let entity_id = self.entity_id(cat)?;
        let trip = trip.ok_or_else(|| self.missing(cat, "trip"))?;
        let trip_id = trip
            .trip_id
            .clone()
            .ok_or_else(|| self.missing(cat, "trip.trip_id"))?;
        let route_id = trip
            .route_id
            .clone()
            .ok_or_else(|| self.missing(cat, "trip.route_id"))?;
        let stop_sequence = update
            .stop_sequence
            .ok_or_else(|| self.missing(cat, "stop_time_update.stop_sequence"))?;
        Ok(Self::unit(
            cat,
            entity_id,
            vec![trip_id, route_id, stop_sequence_text(stop_sequence)],
        ))
    }

    fn vehicle_unit(&self, vp: &VehiclePosition) -> Result<ComparisonUnit, ReconError> {
        let cat = Category::VehiclePosition;
        let entity_id = self.entity_id(cat)?;
        let vehicle_id = vp
            .vehicle
            .as_ref()
            .and_then(|v| v.id.clone())
            .ok_or_else(|| self.missing(cat, "vehicle.id"))?;
        let trip = vp.trip.as_ref().ok_or_else(|| self.missing(cat, "trip"))?;
        let trip_id = trip
            .trip_id
            .clone()
            .ok_or_else(|| self.missing(cat, "trip.trip_id"))?;
        let route_id = trip
            .route_id
            .clone()
            .ok_or_else(|| self.missing(cat, "trip.route_id"))?;
        Ok(Self::unit(cat, entity_id, vec![vehicle_id, trip_id, route_id]))
    }
}

impl Iterator for Units<'_> {
    type Item = Result<ComparisonUnit, ReconError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            UnitsInner::Alert(selectors) => {
                let selector = selectors.next()?;
                Some(self.alert_unit(selector))
            }
            UnitsInner::TripUpdate { trip, updates } => {
                let trip = *trip;
                let update = updates.next()?;
                Some(self.trip_update_unit(trip, update))
            }
            UnitsInner::Vehicle(slot) => {
                let vp = slot.take()?;
                Some(self.vehicle_unit(vp))
            }
        }
    }
}

/// Stop sequences are compared as decimal text, whatever the sink column type.
pub fn stop_sequence_text(stop_sequence: u32) -> String {
    stop_sequence.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Alert, TripUpdate, VehicleDescriptor};

    fn trip(trip_id: &str, route_id: &str) -> TripDescriptor {
        TripDescriptor {
            trip_id: Some(trip_id.into()),
            route_id: Some(route_id.into()),
            ..Default::default()
        }
    }

    fn stu(seq: u32) -> StopTimeUpdate {
        StopTimeUpdate {
            stop_sequence: Some(seq),
            ..Default::default()
        }
    }

    fn units(category: Category, entity: &FeedEntity) -> Vec<ComparisonUnit> {
        match flatten(category, entity) {
            Flattened::Absent => panic!("expected a payload"),
            Flattened::Units(u) => u.collect::<Result<Vec<_>, _>>().unwrap(),
        }
    }

    #[test]
    fn trip_update_yields_one_unit_per_stop_time_update() {
        let entity = FeedEntity {
            id: Some("T1".into()),
            trip_update: Some(TripUpdate {
                trip: Some(trip("trip1", "route1")),
                stop_time_update: vec![stu(1), stu(2)],
                ..Default::default()
            }),
            ..Default::default()
        };
        let out = units(Category::TripUpdate, &entity);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].key.values(), ["T1", "trip1", "route1", "1"]);
        assert_eq!(out[1].key.values(), ["T1", "trip1", "route1", "2"]);
        assert_eq!(out[1].entity_id(), "T1");
    }

    #[test]
    fn alert_yields_one_unit_per_informed_entity() {
        let entity = FeedEntity {
            id: Some("A1".into()),
            alert: Some(Alert {
                informed_entity: vec![
                    EntitySelector { route_id: Some("R1".into()), ..Default::default() },
                    EntitySelector { route_id: Some("R2".into()), ..Default::default() },
                ],
                ..Default::default()
            }),
            ..Default::default()
        };
        let out = units(Category::Alert, &entity);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].key.values(), ["A1", "R2"]);
        assert_eq!(out[1].key.arity(), Category::Alert.arity());
    }

    #[test]
    fn vehicle_position_is_its_own_unit() {
        let entity = FeedEntity {
            id: Some("V1".into()),
            vehicle: Some(VehiclePosition {
                trip: Some(trip("trip9", "route9")),
                vehicle: Some(VehicleDescriptor {
                    id: Some("bus-42".into()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let out = units(Category::VehiclePosition, &entity);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key.values(), ["V1", "bus-42", "trip9", "route9"]);
    }

    #[test]
    fn absent_payload_is_explicit() {
        let entity = FeedEntity { id: Some("X".into()), ..Default::default() };
        for c in Category::ALL {
            assert!(matches!(flatten(c, &entity), Flattened::Absent));
        }
    }

    #[test]
    fn empty_nested_list_yields_no_units() {
        let entity = FeedEntity {
            id: Some("A1".into()),
            alert: Some(Alert::default()),
            ..Default::default()
        };
        assert!(units(Category::Alert, &entity).is_empty());
    }

    #[test]
    fn missing_key_field_is_an_error() {
        let entity = FeedEntity {
            id: Some("T1".into()),
            trip_update: Some(TripUpdate {
                trip: Some(TripDescriptor { trip_id: Some("trip1".into()), ..Default::default() }),
                stop_time_update: vec![stu(1)],
                ..Default::default()
            }),
            ..Default::default()
        };
        let Flattened::Units(mut u) = flatten(Category::TripUpdate, &entity) else {
            panic!("expected units");
        };
        let err = u.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("trip.route_id"), "{err}");
    }

    #[test]
    fn missing_stop_sequence_is_an_error() {
        let entity = FeedEntity {
            id: Some("T1".into()),
            trip_update: Some(TripUpdate {
                trip: Some(trip("trip1", "route1")),
                stop_time_update: vec![StopTimeUpdate::default()],
                ..Default::default()
            }),
            ..Default::default()
        };
        let Flattened::Units(mut u) = flatten(Category::TripUpdate, &entity) else {
            panic!("expected units");
        };
        assert!(matches!(
            u.next(),
            Some(Err(ReconError::MissingKeyField { field: "stop_time_update.stop_sequence", .. }))
        ));
    }

    #[test]
    fn stop_sequence_converts_to_plain_decimal() {
        assert_eq!(stop_sequence_text(0), "0");
        assert_eq!(stop_sequence_text(12), "12");
        assert_eq!(stop_sequence_text(u32::MAX), "4294967295");
    }

    #[test]
    fn entity_without_id_is_an_error() {
        // Encoded without tag 1: only the alert payload is on the wire.
        let feed = crate::feed::FeedMessage {
            header: None,
            entity: vec![FeedEntity {
                id: None,
                alert: Some(Alert {
                    informed_entity: vec![EntitySelector {
                        route_id: Some("R1".into()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
                ..Default::default()
            }],
        };
        let decoded = crate::feed::decode_feed(&prost::Message::encode_to_vec(&feed)).unwrap();
        let entity = &decoded.entity[0];
        assert_eq!(entity.id, None);

        for category in Category::ALL {
            if let Flattened::Units(mut u) = flatten(category, entity) {
                assert!(matches!(
                    u.next(),
                    Some(Err(ReconError::MissingKeyField { field: "entity.id", .. }))
                ));
            }
        }
    }

    #[test]
    fn entity_id_is_checked_before_nested_fields() {
        let entity = FeedEntity {
            id: None,
            trip_update: Some(TripUpdate {
                trip: None,
                stop_time_update: vec![stu(3)],
                ..Default::default()
            }),
            ..Default::default()
        };
        let Flattened::Units(mut u) = flatten(Category::TripUpdate, &entity) else {
            panic!("expected units");
        };
        let err = u.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("'entity.id'"), "{err}");
    }
}
