//! The summary cards shown at the top of the dashboard.

use maud::{Markup, html};

use crate::html::CARD_STYLE;

/// One headline figure on the dashboard.
pub(super) struct SummaryCard {
    /// The label above the figure.
    pub(super) label: &'static str,
    /// The formatted figure, e.g. "$1,234.50".
    pub(super) value: String,
    /// Extra utility classes for the figure, e.g. a signal color.
    pub(super) value_class: &'static str,
}

/// Render the summary cards as a responsive grid.
pub(super) fn summary_cards(cards: &[SummaryCard]) -> Markup {
    html! {
        div class="grid grid-cols-1 sm:grid-cols-3 gap-4 w-full"
        {
            @for card in cards {
                div class=(CARD_STYLE) data-summary-card=(card.label)
                {
                    p class="text-sm text-gray-500 dark:text-gray-400" { (card.label) }

                    p class=(format!("text-2xl font-bold {}", card.value_class))
                    {
                        (card.value)
                    }
                }
            }
        }
    }
}
