//! One-time resolution of the host internals the controller depends on.
//!
//! Everything name-keyed lives here. The rest of the crate only sees the
//! typed [`Bindings`] snapshot produced by [`Bindings::resolve`].

use thiserror::Error;
use wanderer_tweaks_core::{
    Behavior, CampaignContext, FieldKind, FieldSlot, FieldValue, TemplateId,
};

use crate::retirement::{Retirement, RetirementStrategy};

const COMPANION_TEMPLATES: &str = "companion_templates";
const COMPANIONS: &str = "companions";
const TARGET_COMPANION_NUMBER: &str = "target_companion_number";
const SPAWN_FREQUENCY: &str = "random_companion_spawn_frequency_in_weeks";
const SETTLEMENT_COOLDOWN: &str = "companion_spawn_cooldown_for_settlement_in_weeks";
const HEROES_TO_CHECK: &str = "heroes_to_check";

/// Reasons the host internals could not be bound.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    /// The behaviour does not publish a field under the expected name.
    #[error("{behavior:?} exposes no field named `{name}`")]
    MissingField {
        /// Behaviour that was searched.
        behavior: Behavior,
        /// Name that was looked up.
        name: &'static str,
    },
    /// The name resolved to a slot the host then refused to read.
    #[error("{behavior:?} field `{name}` resolved but could not be read")]
    Unreadable {
        /// Behaviour owning the field.
        behavior: Behavior,
        /// Name of the field.
        name: &'static str,
    },
    /// The field exists but holds a different kind of value.
    #[error("{behavior:?} field `{name}` holds {found:?}, expected {expected:?}")]
    UnexpectedShape {
        /// Behaviour owning the field.
        behavior: Behavior,
        /// Name of the field.
        name: &'static str,
        /// Shape the controller requires.
        expected: FieldKind,
        /// Shape the host reported.
        found: FieldKind,
    },
}

/// Typed snapshot of the host internals, resolved once per session.
#[derive(Clone, Debug, PartialEq)]
pub struct Bindings {
    templates: Vec<TemplateId>,
    retirement: Retirement,
    spawn_frequency: FieldSlot,
    settlement_cooldown: FieldSlot,
    heroes_to_check: FieldSlot,
    target_companion_number: f32,
}

impl Bindings {
    /// Resolves every host field required by the controller.
    ///
    /// The companions list is only bound for [`RetirementStrategy::Disable`],
    /// which edits it directly. Any missing or mis-shaped field aborts the
    /// whole resolution.
    pub fn resolve<C>(campaign: &C, strategy: RetirementStrategy) -> Result<Self, BindingError>
    where
        C: CampaignContext + ?Sized,
    {
        let urban = Behavior::UrbanCharacters;

        let templates = match bind_field(campaign, urban, COMPANION_TEMPLATES)? {
            (_, FieldValue::Templates(templates)) => templates.to_vec(),
            (_, other) => {
                return Err(unexpected(
                    urban,
                    COMPANION_TEMPLATES,
                    FieldKind::Templates,
                    other,
                ))
            }
        };

        let target_companion_number = match bind_field(campaign, urban, TARGET_COMPANION_NUMBER)? {
            (_, FieldValue::Float(value)) => value,
            (_, other) => {
                return Err(unexpected(
                    urban,
                    TARGET_COMPANION_NUMBER,
                    FieldKind::Float,
                    other,
                ))
            }
        };

        let retirement = match strategy {
            RetirementStrategy::Kill => Retirement::Kill,
            RetirementStrategy::Disable => Retirement::Disable {
                companions: bind_slot(campaign, urban, COMPANIONS, FieldKind::Heroes)?,
            },
        };

        Ok(Self {
            templates,
            retirement,
            spawn_frequency: bind_slot(campaign, urban, SPAWN_FREQUENCY, FieldKind::Float)?,
            settlement_cooldown: bind_slot(campaign, urban, SETTLEMENT_COOLDOWN, FieldKind::Float)?,
            heroes_to_check: bind_slot(
                campaign,
                Behavior::HeroLastSeenUpdater,
                HEROES_TO_CHECK,
                FieldKind::Heroes,
            )?,
            target_companion_number,
        })
    }

    /// Templates companions are drawn from.
    #[must_use]
    pub fn templates(&self) -> &[TemplateId] {
        &self.templates
    }

    /// Slot of the host's spawn cadence, in weeks.
    #[must_use]
    pub const fn spawn_frequency(&self) -> FieldSlot {
        self.spawn_frequency
    }

    /// Slot of the per-settlement placement cooldown, in weeks.
    #[must_use]
    pub const fn settlement_cooldown(&self) -> FieldSlot {
        self.settlement_cooldown
    }

    /// Slot of the last-seen tracker's hero list.
    #[must_use]
    pub const fn heroes_to_check(&self) -> FieldSlot {
        self.heroes_to_check
    }

    /// Pool size configured on the host.
    #[must_use]
    pub const fn target_companion_number(&self) -> f32 {
        self.target_companion_number
    }

    /// Pool size the controller maintains.
    ///
    /// Every template gets a seat on top of the host's own target so that
    /// older wanderers are not retired before each template had a chance to
    /// be drawn. Negative or non-finite host targets contribute nothing.
    #[must_use]
    pub fn target_wanderer_count(&self) -> usize {
        let host_target = self.target_companion_number;
        let host_seats = if host_target.is_finite() && host_target > 0.0 {
            host_target.floor() as usize
        } else {
            0
        };
        self.templates.len().saturating_add(host_seats)
    }

    pub(crate) const fn retirement(&self) -> Retirement {
        self.retirement
    }
}

fn bind_field<'a, C>(
    campaign: &'a C,
    behavior: Behavior,
    name: &'static str,
) -> Result<(FieldSlot, FieldValue<'a>), BindingError>
where
    C: CampaignContext + ?Sized,
{
    let slot = campaign
        .lookup_field(behavior, name)
        .ok_or(BindingError::MissingField { behavior, name })?;
    let value = campaign
        .field(slot)
        .ok_or(BindingError::Unreadable { behavior, name })?;
    Ok((slot, value))
}

fn bind_slot<C>(
    campaign: &C,
    behavior: Behavior,
    name: &'static str,
    expected: FieldKind,
) -> Result<FieldSlot, BindingError>
where
    C: CampaignContext + ?Sized,
{
    let (slot, value) = bind_field(campaign, behavior, name)?;
    if value.kind() != expected {
        return Err(unexpected(behavior, name, expected, value));
    }
    Ok(slot)
}

fn unexpected(
    behavior: Behavior,
    name: &'static str,
    expected: FieldKind,
    found: FieldValue<'_>,
) -> BindingError {
    BindingError::UnexpectedShape {
        behavior,
        name,
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(templates: u32, target: f32) -> Bindings {
        Bindings {
            templates: (0..templates).map(TemplateId::new).collect(),
            retirement: Retirement::Kill,
            spawn_frequency: FieldSlot::new(0),
            settlement_cooldown: FieldSlot::new(1),
            heroes_to_check: FieldSlot::new(2),
            target_companion_number: target,
        }
    }

    #[test]
    fn target_truncates_host_pool_size() {
        assert_eq!(bindings(5, 6.4).target_wanderer_count(), 11);
        assert_eq!(bindings(5, 6.99).target_wanderer_count(), 11);
        assert_eq!(bindings(0, 3.0).target_wanderer_count(), 3);
        assert_eq!(bindings(5, 6.4).target_companion_number(), 6.4);
    }

    #[test]
    fn degenerate_host_targets_contribute_nothing() {
        assert_eq!(bindings(4, -2.5).target_wanderer_count(), 4);
        assert_eq!(bindings(4, f32::NAN).target_wanderer_count(), 4);
        assert_eq!(bindings(4, f32::INFINITY).target_wanderer_count(), 4);
    }
}
