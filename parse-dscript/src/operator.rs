use ahash::HashMap;
use ahash::HashMapExt;
use once_cell::sync::Lazy;
use serde::Serialize;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub enum OperatorName {
  Addition,
  Assignment,
  AssignmentAddition,
  AssignmentBitwiseAnd,
  AssignmentBitwiseLeftShift,
  AssignmentBitwiseOr,
  AssignmentBitwiseRightShift,
  AssignmentBitwiseUnsignedRightShift,
  AssignmentBitwiseXor,
  AssignmentDivision,
  AssignmentMultiplication,
  AssignmentRemainder,
  AssignmentSubtraction,
  BitwiseAnd,
  BitwiseLeftShift,
  BitwiseNot,
  BitwiseOr,
  BitwiseRightShift,
  BitwiseUnsignedRightShift,
  BitwiseXor,
  Call,
  Comma,
  ComputedMemberAccess,
  Conditional,
  // Only used to represent the minimum precedence of the alternate branch of
  // a conditional expression; never appears in a node.
  ConditionalAlternate,
  Division,
  Equality,
  GreaterThan,
  GreaterThanOrEqual,
  Inequality,
  LessThan,
  LessThanOrEqual,
  LogicalAnd,
  LogicalNot,
  LogicalOr,
  MemberAccess,
  Multiplication,
  PostfixDecrement,
  PostfixIncrement,
  PrefixDecrement,
  PrefixIncrement,
  Remainder,
  StrictEquality,
  StrictInequality,
  Subtraction,
  Typeof,
  UnaryNegation,
  UnaryPlus,
  Void,
}

impl OperatorName {
  pub fn is_assignment(&self) -> bool {
    matches!(
      self,
      OperatorName::Assignment
        | OperatorName::AssignmentAddition
        | OperatorName::AssignmentBitwiseAnd
        | OperatorName::AssignmentBitwiseLeftShift
        | OperatorName::AssignmentBitwiseOr
        | OperatorName::AssignmentBitwiseRightShift
        | OperatorName::AssignmentBitwiseUnsignedRightShift
        | OperatorName::AssignmentBitwiseXor
        | OperatorName::AssignmentDivision
        | OperatorName::AssignmentMultiplication
        | OperatorName::AssignmentRemainder
        | OperatorName::AssignmentSubtraction
    )
  }

  /// The non-assignment operator a compound assignment applies before
  /// storing, if any (`+=` applies `+`).
  pub fn compound_base(&self) -> Option<OperatorName> {
    Some(match self {
      OperatorName::AssignmentAddition => OperatorName::Addition,
      OperatorName::AssignmentBitwiseAnd => OperatorName::BitwiseAnd,
      OperatorName::AssignmentBitwiseLeftShift => OperatorName::BitwiseLeftShift,
      OperatorName::AssignmentBitwiseOr => OperatorName::BitwiseOr,
      OperatorName::AssignmentBitwiseRightShift => OperatorName::BitwiseRightShift,
      OperatorName::AssignmentBitwiseUnsignedRightShift => {
        OperatorName::BitwiseUnsignedRightShift
      }
      OperatorName::AssignmentBitwiseXor => OperatorName::BitwiseXor,
      OperatorName::AssignmentDivision => OperatorName::Division,
      OperatorName::AssignmentMultiplication => OperatorName::Multiplication,
      OperatorName::AssignmentRemainder => OperatorName::Remainder,
      OperatorName::AssignmentSubtraction => OperatorName::Subtraction,
      _ => return None,
    })
  }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Associativity {
  Left,
  Right,
}

#[derive(Copy, Clone, Debug)]
pub struct Operator {
  pub name: OperatorName,
  pub precedence: u8,
  pub associativity: Associativity,
}

#[rustfmt::skip]
pub static OPERATORS: Lazy<HashMap<OperatorName, Operator>> = Lazy::new(|| {
  use Associativity::*;
  use OperatorName::*;
  let operators: &[(OperatorName, u8, Associativity)] = &[
    (Comma, 1, Left),

    (Assignment, 3, Right),
    (AssignmentAddition, 3, Right),
    (AssignmentBitwiseAnd, 3, Right),
    (AssignmentBitwiseLeftShift, 3, Right),
    (AssignmentBitwiseOr, 3, Right),
    (AssignmentBitwiseRightShift, 3, Right),
    (AssignmentBitwiseUnsignedRightShift, 3, Right),
    (AssignmentBitwiseXor, 3, Right),
    (AssignmentDivision, 3, Right),
    (AssignmentMultiplication, 3, Right),
    (AssignmentRemainder, 3, Right),
    (AssignmentSubtraction, 3, Right),
    (ConditionalAlternate, 3, Right),

    (Conditional, 4, Right),

    (LogicalOr, 5, Left),
    (LogicalAnd, 6, Left),
    (BitwiseOr, 7, Left),
    (BitwiseXor, 8, Left),
    (BitwiseAnd, 9, Left),

    (Equality, 10, Left),
    (Inequality, 10, Left),
    (StrictEquality, 10, Left),
    (StrictInequality, 10, Left),

    (GreaterThan, 11, Left),
    (GreaterThanOrEqual, 11, Left),
    (LessThan, 11, Left),
    (LessThanOrEqual, 11, Left),

    (BitwiseLeftShift, 12, Left),
    (BitwiseRightShift, 12, Left),
    (BitwiseUnsignedRightShift, 12, Left),

    (Addition, 13, Left),
    (Subtraction, 13, Left),

    (Division, 14, Left),
    (Multiplication, 14, Left),
    (Remainder, 14, Left),

    (BitwiseNot, 17, Right),
    (LogicalNot, 17, Right),
    (PrefixDecrement, 17, Right),
    (PrefixIncrement, 17, Right),
    (Typeof, 17, Right),
    (UnaryNegation, 17, Right),
    (UnaryPlus, 17, Right),
    (Void, 17, Right),

    (PostfixDecrement, 18, Left),
    (PostfixIncrement, 18, Left),

    (Call, 20, Left),
    (ComputedMemberAccess, 20, Left),
    (MemberAccess, 20, Left),
  ];
  let mut map = HashMap::<OperatorName, Operator>::new();
  for &(name, precedence, associativity) in operators {
    map.insert(name, Operator {
      name,
      precedence,
      associativity,
    });
  }
  map
});
