use crate::assets::color::parse_colors;
use crate::card::effective::ResolvedBorder;
use crate::card::layers::BORDER;
use crate::card::scale::ScaleContext;
use crate::foundation::error::CardResult;
use crate::render::gradient::GradientSpec;
use crate::render::plan::{DrawOp, LayerPlan, Paint, Shape};

/// Gradient across the whole canvas with the inner card punched out, leaving a ring.
pub fn build(scale: &ScaleContext, border: &ResolvedBorder) -> CardResult<LayerPlan> {
    let colors = parse_colors(border.colors.as_slice())?;
    let spec = GradientSpec::new(colors, border.align.direction(), "borderColor")?;

    let mut plan = LayerPlan::new(BORDER);
    plan.push(DrawOp::Fill {
        shape: Shape::Rect(scale.canvas()),
        paint: Paint::Linear(spec.linear(scale.canvas())),
        opacity: 1.0,
    });
    plan.push(DrawOp::punch(Shape::rounded(
        scale.rect(9.0, 9.0, 867.0, 285.0),
        scale.radius(25.0),
    )));
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::options::BorderAlign;
    use crate::foundation::core::Point;

    fn border(n: usize, align: BorderAlign) -> ResolvedBorder {
        ResolvedBorder {
            colors: vec!["#ff0000".to_owned(); n],
            align,
        }
    }

    #[test]
    fn twenty_colors_ok_twenty_one_rejected() {
        let s = ScaleContext::reference();
        assert!(build(&s, &border(20, BorderAlign::Horizontal)).is_ok());
        let err = build(&s, &border(21, BorderAlign::Horizontal)).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("21"));
    }

    #[test]
    fn vertical_runs_top_to_bottom() {
        let s = ScaleContext::new(Some(1770), Some(606));
        let plan = build(&s, &border(2, BorderAlign::Vertical)).unwrap();
        let DrawOp::Fill {
            paint: Paint::Linear(g),
            ..
        } = &plan.ops[0]
        else {
            panic!("expected gradient fill");
        };
        assert_eq!((g.start, g.end), (Point::new(0.0, 0.0), Point::new(0.0, 606.0)));
    }
}
