//! Repository for the joined marker snapshot.

use expo_core::types::EventYear;
use sqlx::PgPool;

use crate::models::marker_row::MarkerRow;

/// Reads whole markers across the namespace, assignment, and company tables.
pub struct MarkerRepo;

impl MarkerRepo {
    /// List every marker that has a core row, with booth content resolved
    /// for `event_year`. Ordered by marker id.
    pub async fn list_for_year(
        pool: &PgPool,
        event_year: EventYear,
    ) -> Result<Vec<MarkerRow>, sqlx::Error> {
        sqlx::query_as::<_, MarkerRow>(
            "SELECT c.marker_id, \
                    c.lat, c.lng, c.angle, c.rect_width, c.rect_height, c.core_locked, \
                    a.icon_url, a.icon_size, a.icon_color, a.class_name, a.glyph, \
                    a.glyph_color, a.glyph_size, a.glyph_anchor, a.shadow_scale, \
                    a.font_weight, a.appearance_locked, \
                    t.name, t.logo, t.website, t.info, t.booth_number, t.content_locked, \
                    asg.company_id, asg.booth_number AS assigned_booth_number, \
                    co.name AS company_name, co.logo AS company_logo, \
                    co.website AS company_website, co.info AS company_info \
             FROM marker_core c \
             LEFT JOIN marker_appearance a ON a.marker_id = c.marker_id \
             LEFT JOIN marker_content t ON t.marker_id = c.marker_id \
             LEFT JOIN assignments asg \
                    ON asg.marker_id = c.marker_id AND asg.event_year = $1 \
             LEFT JOIN companies co ON co.id = asg.company_id \
             ORDER BY c.marker_id",
        )
        .bind(event_year)
        .fetch_all(pool)
        .await
    }
}
